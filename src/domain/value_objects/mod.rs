pub mod permission;
pub mod string_multiset;
