use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("board {width}x{height} outside the supported 1..=6 range")]
    InvalidDimensions { width: u8, height: u8 },

    #[error("board has {got} cells, expected {expected}")]
    BoardSizeMismatch { expected: usize, got: usize },

    #[error("constraint list holds {len} entries, exceeding the {max} limit")]
    TooManyConstraints { len: usize, max: usize },

    #[error("cell ({x},{y}) out of range for a {width}x{height} board")]
    CellOutOfRange { x: u8, y: u8, width: u8, height: u8 },

    #[error("row index {index} out of range for height {height}")]
    RowOutOfRange { index: u8, height: u8 },

    #[error("column index {index} out of range for width {width}")]
    ColumnOutOfRange { index: u8, width: u8 },
}
