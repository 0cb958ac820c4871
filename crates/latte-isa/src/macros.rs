/// Declares a closed enumeration with a fixed hardware encoding and a canonical mnemonic.
///
/// Every generated type gets `ALL`, `from_raw`, `raw`, `name`, `from_name` and a
/// `Display` impl printing the mnemonic. The name lookup table is built on first use and
/// is read-only afterwards.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $raw:literal => $text:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub const fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $($raw => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub const fn raw(self) -> u32 {
                match self {
                    $(Self::$variant => $raw,)*
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                static TABLE: std::sync::OnceLock<std::collections::HashMap<&'static str, $name>> =
                    std::sync::OnceLock::new();
                TABLE
                    .get_or_init(|| Self::ALL.iter().map(|value| (value.name(), *value)).collect())
                    .get(name)
                    .copied()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Declares an ALU opcode table: a [`named_enum!`] whose entries also carry the operand
/// count and the [`AluFlags`](crate::AluFlags) describing unit placement and operand types.
macro_rules! alu_opcodes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $variant:ident = $raw:literal => $text:literal, $srcs:literal, [$($flag:ident)|*],
            )*
        }
    ) => {
        named_enum! {
            $(#[$meta])*
            pub enum $name {
                $($variant = $raw => $text,)*
            }
        }

        impl $name {
            pub const fn num_srcs(self) -> usize {
                match self {
                    $(Self::$variant => $srcs,)*
                }
            }

            pub const fn flags(self) -> $crate::AluFlags {
                match self {
                    $(Self::$variant => $crate::AluFlags::empty()$(.union($crate::AluFlags::$flag))*,)*
                }
            }
        }
    };
}

/// Declares a 32-bit instruction word with typed accessors.
///
/// Integer fields are declared as `getter / setter: lo, width;` and single-bit flags as
/// `getter / setter: bit;` inside a trailing `flags { ... }` block. Setters are builders
/// returning a new word and silently truncate the value to the field width.
macro_rules! word {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($field:ident / $with:ident: $lo:literal, $width:literal;)*
        }
        $(flags {
            $($flag:ident / $with_flag:ident: $bit:literal;)*
        })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);

        impl $name {
            $(
                #[inline]
                pub const fn $field(self) -> u32 {
                    $crate::words::get_field(self.0, $lo, $width)
                }

                #[inline]
                #[must_use]
                pub const fn $with(self, value: u32) -> Self {
                    Self($crate::words::set_field(self.0, $lo, $width, value))
                }
            )*

            $($(
                #[inline]
                pub const fn $flag(self) -> bool {
                    (self.0 >> $bit) & 1 != 0
                }

                #[inline]
                #[must_use]
                pub const fn $with_flag(self, value: bool) -> Self {
                    Self($crate::words::set_field(self.0, $bit, 1, value as u32))
                }
            )*)?
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value.0
            }
        }
    };
}
