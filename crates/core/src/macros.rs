//! Code-valued enum helper.
//!
//! Every status or kind column stores its upper-case code as TEXT. The
//! generated enum serializes to the same code and parses it back with a
//! validation error listing the accepted values.

macro_rules! define_code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $code)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Every stored code, in declaration order.
            pub const CODES: &'static [&'static str] = &[$($code),+];

            /// The stored code of this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Parse a stored code.
            pub fn from_str_value(s: &str) -> Result<Self, $crate::error::CoreError> {
                match s {
                    $( $code => Ok($name::$variant), )+
                    _ => Err($crate::error::CoreError::Validation(format!(
                        "Invalid {} '{}'. Must be one of: {}",
                        stringify!($name),
                        s,
                        Self::CODES.join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use define_code_enum;
