// Core modules implementing value kinds, codecs, the backing document, and the bag.
pub mod bag;
pub mod codec;
pub mod document;
pub mod error;
pub mod kind;
pub mod param;
pub mod watch;
