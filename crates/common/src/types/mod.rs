mod city;
mod search_result;

pub use city::*;
pub use search_result::*;
