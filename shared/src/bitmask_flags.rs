use num_traits::{One, PrimInt};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A set of flags packed into a single integer.
///
/// Used for the held/pressed action sets sampled each frame and for the
/// character's orthogonal movement modes.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::new(T::zero());
        flags.add_many(tags);
        flags
    }

    // --- Single Tag Operations ---
    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, tag: U, on: bool) {
        if on {
            self.add(tag);
        } else {
            self.remove(tag);
        }
    }

    /// Flip a flag, returning its new state.
    pub fn toggle<U: FlagBitmask<Storage = T> + Copy>(&mut self, tag: U) -> bool {
        let on = !self.has(tag);
        self.set(tag, on);
        on
    }

    // --- Bulk Operations ---
    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    // --- Logic Gates ---
    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) == combined
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Besides the trait impl, the enum gets an `ALL` table in declaration order and
/// `name()` / `from_name()` for the variant identifiers.
///
/// Example:
/// ```rust
/// shared::define_bitmask_flags!(LightState, u8, {
///     Headlights,
///     Indicators,
///     Hazards,
/// });
/// assert_eq!(LightState::from_name("Hazards"), Some(LightState::Hazards));
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_bitmask_flags!(Lamp, u8, { Red, Green, Blue });

    #[test]
    fn toggling_flips_single_bit() {
        let mut flags = BitmaskFlags::<u8>::default();
        assert!(flags.toggle(Lamp::Green));
        assert!(flags.has(Lamp::Green));
        assert!(!flags.has(Lamp::Red));
        assert!(!flags.toggle(Lamp::Green));
        assert!(flags.is_empty());
    }

    #[test]
    fn gates_combine_masks() {
        let flags = BitmaskFlags::from_flags(&[Lamp::Red, Lamp::Blue]);
        assert!(flags.has_all(&[Lamp::Red, Lamp::Blue]));
        assert!(!flags.has_all(&[Lamp::Red, Lamp::Green]));
        assert!(flags.has_any(&[Lamp::Green, Lamp::Blue]));
        assert!(!flags.has_any::<Lamp>(&[]));
    }

    #[test]
    fn names_round_trip_through_lookup() {
        assert_eq!(Lamp::ALL.len(), 3);
        assert_eq!(Lamp::Blue.name(), "Blue");
        assert_eq!(Lamp::from_name("Red"), Some(Lamp::Red));
        assert_eq!(Lamp::from_name("Purple"), None);
    }
}
