//! Numbered diagnostic codes for the compiler core.

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Problem that does not prevent emitting output
    Warning,
    /// Problem that suppresses output at the end of the run
    Error,
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // ===== Type naming (E70xx) =====
    E7001, // Invalid script name on type
    E7002, // Conflicting namespace attributes
    E7003, // Namespace attribute on nested type
    E7004, // Mixin on invalid type
    E7005, // Global methods on invalid type
    E7006, // Generic argument handling unspecified
    E7007, // Invalid script namespace

    // ===== Serializable type rules (E71xx) =====
    E7101, // Base class not serializable
    E7102, // Base interface not serializable
    E7103, // Instance event on serializable type
    E7104, // Virtual or overriding member on serializable type
    E7105, // Instance method on serializable interface

    // ===== Member naming (E72xx) =====
    E7201, // Invalid script name on member
    E7202, // Member name not available
    E7203, // Implemented interface members disagree on name
    E7204, // Naming attribute on overriding member
    E7205, // Member name is a reserved identifier

    // ===== Method attributes (E73xx) =====
    E7301, // Operator attribute on non-operator method
    E7302, // Operator attribute on conversion operator
    E7303, // Script-skip method has wrong shape
    E7304, // Script alias on instance method
    E7305, // Invalid inline code template
    E7306, // Override of inline-code method
    E7307, // Enumerate-as-array on wrong method
    E7308, // Expand-params without a parameter array
    E7309, // Instance-method-on-first-argument on instance method

    // ===== Properties and fields (E74xx) =====
    E7401, // Intrinsic property on interface member
    E7402, // Intrinsic property on override
    E7403, // Intrinsic property on overridable property
    E7404, // Intrinsic property on interface implementation
    E7405, // Intrinsic indexer must take one parameter
    E7406, // Inline constant on non-const field

    // ===== Constructors (E75xx) =====
    E7501, // Record constructor parameter matches no member
    E7502, // Record constructor parameter type mismatch
    E7503, // Alternate signature without exactly one main constructor
    E7504, // Invalid inline code template on constructor

    // ===== Runtime emission (E76xx) =====
    E7601, // Character value cannot be upcast
}

impl DiagnosticCode {
    /// The fixed severity of this code.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::E7006 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Code in display form, e.g. `"E7001"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::E7001 => "E7001",
            DiagnosticCode::E7002 => "E7002",
            DiagnosticCode::E7003 => "E7003",
            DiagnosticCode::E7004 => "E7004",
            DiagnosticCode::E7005 => "E7005",
            DiagnosticCode::E7006 => "E7006",
            DiagnosticCode::E7007 => "E7007",
            DiagnosticCode::E7101 => "E7101",
            DiagnosticCode::E7102 => "E7102",
            DiagnosticCode::E7103 => "E7103",
            DiagnosticCode::E7104 => "E7104",
            DiagnosticCode::E7105 => "E7105",
            DiagnosticCode::E7201 => "E7201",
            DiagnosticCode::E7202 => "E7202",
            DiagnosticCode::E7203 => "E7203",
            DiagnosticCode::E7204 => "E7204",
            DiagnosticCode::E7205 => "E7205",
            DiagnosticCode::E7301 => "E7301",
            DiagnosticCode::E7302 => "E7302",
            DiagnosticCode::E7303 => "E7303",
            DiagnosticCode::E7304 => "E7304",
            DiagnosticCode::E7305 => "E7305",
            DiagnosticCode::E7306 => "E7306",
            DiagnosticCode::E7307 => "E7307",
            DiagnosticCode::E7308 => "E7308",
            DiagnosticCode::E7309 => "E7309",
            DiagnosticCode::E7401 => "E7401",
            DiagnosticCode::E7402 => "E7402",
            DiagnosticCode::E7403 => "E7403",
            DiagnosticCode::E7404 => "E7404",
            DiagnosticCode::E7405 => "E7405",
            DiagnosticCode::E7406 => "E7406",
            DiagnosticCode::E7501 => "E7501",
            DiagnosticCode::E7502 => "E7502",
            DiagnosticCode::E7503 => "E7503",
            DiagnosticCode::E7504 => "E7504",
            DiagnosticCode::E7601 => "E7601",
        }
    }
}
