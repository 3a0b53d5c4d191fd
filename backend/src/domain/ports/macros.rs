//! Macro for declaring port error enums.
//!
//! `define_port_error!` expands an enum of struct-like or unit variants into
//! a `thiserror` enum plus, per variant, a snake_case constructor taking
//! `impl Into<FieldType>` arguments and a `kind()` name for log fields.

macro_rules! define_port_error {
    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };
    (@pattern $variant:ident { $($field:ident : $ty:ty),* }) => { Self::$variant { .. } };
    (@pattern $variant:ident) => { Self::$variant };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Snake_case variant name for structured log fields.
            pub fn kind(&self) -> &'static str {
                ::paste::paste! {
                    match self {
                        $(
                            define_port_error!(@pattern $variant $( { $($field : $ty),* } )?)
                                => stringify!([<$variant:snake>]),
                        )*
                    }
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    define_port_error! {
        pub enum ProbeError {
            Missing { key: String } => "missing: {key}",
            Exhausted { limit: u64 } => "exhausted after {limit}",
            Taken { index: String, attempts: u32 } => "{index} taken after {attempts} attempts",
            Closed => "closed",
        }
    }

    #[rstest]
    fn string_fields_accept_str() {
        let err = ProbeError::missing("user 1");
        assert_eq!(err.to_string(), "missing: user 1");
        assert_eq!(err.kind(), "missing");
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = ProbeError::taken("email", 3_u32);
        assert_eq!(
            err,
            ProbeError::Taken {
                index: "email".to_owned(),
                attempts: 3
            }
        );
        assert_eq!(err.kind(), "taken");
    }

    #[rstest]
    fn unit_variants_get_constructors() {
        assert_eq!(ProbeError::closed(), ProbeError::Closed);
        assert_eq!(ProbeError::exhausted(9_u64).kind(), "exhausted");
    }
}
