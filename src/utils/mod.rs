pub mod enum_text;
pub mod time;
