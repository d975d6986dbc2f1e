use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// The declaration kind a [`Symbol`] was extracted as.
///
/// Stored and transmitted as the stable string returned by [`Kind::code`], never as a single
/// character: a one-rune encoding loses information as soon as a new kind is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Enum,
    Variable,
}

impl Kind {
    /// Stable string code used as the on-disk representation and in content IDs.
    pub fn code(&self) -> &'static str {
        match self {
            Kind::Function => "function",
            Kind::Method => "method",
            Kind::Class => "class",
            Kind::Interface => "interface",
            Kind::Type => "type",
            Kind::Enum => "enum",
            Kind::Variable => "variable",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "function" => Kind::Function,
            "method" => Kind::Method,
            "class" => Kind::Class,
            "interface" => Kind::Interface,
            "type" => Kind::Type,
            "enum" => Kind::Enum,
            "variable" => Kind::Variable,
            _ => return None,
        })
    }

    /// The tree-sitter node kinds that produce a declaration of this [`Kind`].
    pub fn from_node_kind(node_kind: &str) -> Option<Self> {
        Some(match node_kind {
            "function_declaration" => Kind::Function,
            "method_definition" | "method_signature" => Kind::Method,
            "class_declaration" => Kind::Class,
            "interface_declaration" => Kind::Interface,
            "type_alias_declaration" => Kind::Type,
            "enum_declaration" => Kind::Enum,
            "variable_declarator" => Kind::Variable,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Language tag for a parsed source file. The core targets TypeScript/JavaScript only; `Tsx`
/// selects the TSX grammar variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLang {
    Ts,
    Tsx,
}

impl SourceLang {
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".tsx") {
            Some(SourceLang::Tsx)
        } else if path.ends_with(".ts") && !path.ends_with(".d.ts") {
            Some(SourceLang::Ts)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLang::Ts => "ts",
            SourceLang::Tsx => "tsx",
        }
    }
}

impl std::fmt::Display for SourceLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named declaration extracted from source, with position metadata.
///
/// `(file, start_line, end_line, kind, name)` uniquely determines [`Symbol::id`]: the hex SHA-1 of
/// `"<file>:<start>:<end>:<kind-code>:<name>"`. Two parses of identical bytes always produce the
/// same ID set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    id: String,
    name: String,
    kind: Kind,
    file: String,
    lang: SourceLang,
    node_type: String,
    start_line: u32,
    end_line: u32,
    start_byte: usize,
    end_byte: usize,
    docstring: String,
}

impl Symbol {
    /// Computes the content ID for a would-be symbol without constructing one.
    pub fn compute_id(file: &str, start_line: u32, end_line: u32, kind: Kind, name: &str) -> String {
        let seed = format!("{file}:{start_line}:{end_line}:{}:{name}", kind.code());
        let mut hasher = Sha1::new();
        hasher.update(seed.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        kind: Kind,
        file: String,
        lang: SourceLang,
        node_type: String,
        start_line: u32,
        end_line: u32,
        start_byte: usize,
        end_byte: usize,
        docstring: String,
    ) -> Self {
        let id = Self::compute_id(&file, start_line, end_line, kind, &name);
        Self {
            id,
            name,
            kind,
            file,
            lang,
            node_type,
            start_line,
            end_line,
            start_byte,
            end_byte,
            docstring,
        }
    }

    /// Reconstitutes a symbol already assigned an ID (used by store adapters reading rows back).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        name: String,
        kind: Kind,
        file: String,
        lang: SourceLang,
        node_type: String,
        start_line: u32,
        end_line: u32,
        start_byte: usize,
        end_byte: usize,
        docstring: String,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            file,
            lang,
            node_type,
            start_line,
            end_line,
            start_byte,
            end_byte,
            docstring,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn lang(&self) -> SourceLang {
        self.lang
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn start_byte(&self) -> usize {
        self.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.end_byte
    }

    pub fn docstring(&self) -> &str {
        &self.docstring
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file, self.start_line, self.end_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_across_reconstructions() {
        let a = Symbol::new(
            "add".into(),
            Kind::Function,
            "a.ts".into(),
            SourceLang::Ts,
            "function_declaration".into(),
            1,
            1,
            0,
            40,
            String::new(),
        );
        let b = Symbol::new(
            "add".into(),
            Kind::Function,
            "a.ts".into(),
            SourceLang::Ts,
            "function_declaration".into(),
            1,
            1,
            0,
            40,
            "docs differ but identity fields don't".into(),
        );
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn id_changes_with_any_identity_field() {
        let base = Symbol::compute_id("a.ts", 1, 1, Kind::Function, "add");
        assert_ne!(base, Symbol::compute_id("b.ts", 1, 1, Kind::Function, "add"));
        assert_ne!(base, Symbol::compute_id("a.ts", 2, 1, Kind::Function, "add"));
        assert_ne!(base, Symbol::compute_id("a.ts", 1, 1, Kind::Method, "add"));
        assert_ne!(base, Symbol::compute_id("a.ts", 1, 1, Kind::Function, "sub"));
    }

    #[test]
    fn kind_code_round_trips() {
        for kind in [
            Kind::Function,
            Kind::Method,
            Kind::Class,
            Kind::Interface,
            Kind::Type,
            Kind::Enum,
            Kind::Variable,
        ] {
            assert_eq!(Kind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn source_lang_from_path() {
        assert_eq!(SourceLang::from_path("a.ts"), Some(SourceLang::Ts));
        assert_eq!(SourceLang::from_path("a.tsx"), Some(SourceLang::Tsx));
        assert_eq!(SourceLang::from_path("a.d.ts"), None);
        assert_eq!(SourceLang::from_path("a.js"), None);
    }
}
