mod is_valid;

pub use is_valid::IsValid;
