use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned identifier. To retrieve the `&str`, use
/// [`Interner::get`].
///
/// Two names compare equal if and only if they were interned from equal
/// strings by the same [`Interner`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(
    // Here we use a NonZeroU32 to leverage niche layout optimization.
    NonZeroU32,
);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Identifier interner, one per compilation.
#[derive(Default)]
pub struct Interner {
    map: HashMap<Rc<str>, Name>,
    names: Vec<Rc<str>>,
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, name) in self.names.iter().enumerate() {
            map.entry(&(i + 1), name);
        }
        map.finish()
    }
}

impl Interner {
    pub fn with_capacity(capacity: usize) -> Interner {
        Interner {
            map: HashMap::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Interns the provided string, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, value: &str) -> Name {
        if let Some(name) = self.map.get(value) {
            return *name;
        }
        let len = u32::try_from(self.names.len()).expect("interned out of capacity");
        let name = Name(NonZeroU32::MIN.saturating_add(len));
        let key: Rc<str> = Rc::from(value);
        self.names.push(Rc::clone(&key));
        self.map.insert(key, name);
        name
    }

    /// Returns the handle of an already interned string, without interning
    /// it.
    pub fn lookup(&self, value: &str) -> Option<Name> {
        self.map.get(value).copied()
    }

    /// Returns the string for the provided [`Name`]. Panics if the name was
    /// produced by another interner.
    pub fn get(&self, name: Name) -> &str {
        &self.names[name.0.get() as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::with_capacity(3);

        let color1 = i.intern("color");
        let pos1 = i.intern("pos0");
        let foo1 = i.intern("foo");

        let color2 = i.intern("color");
        let pos2 = i.intern("pos0");

        assert_eq!(color1, color2);
        assert_eq!(pos1, pos2);
        assert_ne!(color1, foo1);
        assert_eq!(i.len(), 3);

        assert_eq!(i.get(color1), "color");
        assert_eq!(i.get(foo1), "foo");
        assert_eq!(i.lookup("pos0"), Some(pos1));
        assert_eq!(i.lookup("pos1"), None);
    }
}
