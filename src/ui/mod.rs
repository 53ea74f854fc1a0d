pub mod picker;

pub use picker::{DevicePicker, PickerRow, RefreshOutcome, placeholder_devices};
