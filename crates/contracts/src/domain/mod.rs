pub mod a001_movement_tag;
pub mod a002_movement_line;
