pub mod illustration_row;

pub use illustration_row::{NewAspectRow, NewIllustrationRow};
