//! Code generation options

/// Knobs for one code generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Lower unsupported constructs to a null value with a warning instead
    /// of failing, and tolerate a missing entry point. Meant for iterating
    /// on an incomplete front end, never for release builds.
    pub lenient: bool,
}

impl CodegenOptions {
    /// Fail on the first construct that cannot be lowered
    pub fn strict() -> Self {
        Self { lenient: false }
    }

    /// Warn and continue past unsupported constructs
    pub fn lenient() -> Self {
        Self { lenient: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        assert_eq!(CodegenOptions::default(), CodegenOptions::strict());
        assert!(CodegenOptions::lenient().lenient);
    }
}
