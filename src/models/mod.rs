pub mod detection_types;
pub mod ui_types;
