// Core modules implementing schema layouts, blob decoding, and error modeling.
pub mod decode;
pub mod error;
pub mod layout;
pub mod script;
