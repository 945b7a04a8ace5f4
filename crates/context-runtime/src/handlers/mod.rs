//! # Request Handlers
//!
//! Methods the demo contexts serve.
//!
//! | Method           | Served by | Notes                                      |
//! |------------------|-----------|--------------------------------------------|
//! | `addNumbers`     | worker    | immediate sum                              |
//! | `addNumbersSlow` | worker    | polls its token between steps              |
//! | `hello`          | worker    | forwards to the main context via the relay |
//! | `hello`          | main      | answers forwarded calls                    |

pub mod arithmetic;
pub mod greeting;

pub use arithmetic::{AddNumbers, AddNumbersSlow, Operands};
pub use greeting::{PageHello, WorkerHello};

/// Method names used by the demo.
pub mod methods {
    pub const ADD_NUMBERS: &str = "addNumbers";
    pub const ADD_NUMBERS_SLOW: &str = "addNumbersSlow";
    pub const HELLO: &str = "hello";
}
