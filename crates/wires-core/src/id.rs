use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for component pids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Persistent identifier of a wire component.
///
/// Pids come from the console's configuration store and are stable across
/// sessions. Stored as a 4-byte `Spur`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(Spur);

impl Pid {
    /// Intern a pid string, or return the existing handle if already interned.
    pub fn intern(s: &str) -> Self {
        Pid(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Look up a pid without interning it. Returns `None` for strings that
    /// were never seen, which means no component can carry that pid.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(Pid)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.as_str())
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Pid::intern(&s))
    }
}
