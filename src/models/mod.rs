pub mod checkpoint;
pub mod coordinates;
pub mod event;
pub mod package;
