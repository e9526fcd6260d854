//! Typed indices into a [`Program`](crate::Program).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($repr:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $repr);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Parse-object record type.
    TypeId(u16),
    "T"
);
define_id!(
    /// Slot of a parse-object record.
    SlotId(u16),
    "s"
);
define_id!(
    /// Generated routine handle. Reserved before the body exists.
    RoutineId(u32),
    "R"
);
define_id!(
    /// Combined token pattern.
    TokenSetId(u16),
    "K"
);
define_id!(ExprId(u32), "E");
define_id!(
    /// Instruction address.
    Addr(u32),
    "@"
);

impl Addr {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
