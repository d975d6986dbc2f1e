use serde::{Deserialize, Serialize};

use super::symbol::{Kind, SourceLang};

/// The embeddable unit paired 1:1 with a [`super::Symbol`]: `id` is always the symbol's content
/// ID, never independently generated. Any chunk emitted by the parser is always accompanied by
/// its symbol in the same batch for a given file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
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
    /// Full source text of the declaration.
    content: String,
    /// Single-line rendering of the declaration's signature (first line, trimmed).
    signature: String,
    docstring: String,
}

impl CodeChunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
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
        content: String,
        docstring: String,
    ) -> Self {
        let signature = Self::derive_signature(&content);
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
            content,
            signature,
            docstring,
        }
    }

    /// Reconstitutes a chunk already carrying a computed signature (store adapters).
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
        content: String,
        signature: String,
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
            content,
            signature,
            docstring,
        }
    }

    fn derive_signature(content: &str) -> String {
        content
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
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

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn docstring(&self) -> &str {
        &self.docstring
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file, self.start_line, self.end_line)
    }

    /// Text fed to the embedder: name, kind, signature, docstring and content concatenated so
    /// semantically similar declarations land close together regardless of exact wording.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{} [{}] {}", self.name, self.kind.code(), self.signature);
        if !self.docstring.is_empty() {
            text.push('\n');
            text.push_str(&self.docstring);
        }
        text.push('\n');
        text.push_str(&self.content);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_matches_symbol_id() {
        let id = crate::domain::Symbol::compute_id("a.ts", 1, 1, Kind::Function, "add");
        let chunk = CodeChunk::new(
            id.clone(),
            "add".into(),
            Kind::Function,
            "a.ts".into(),
            SourceLang::Ts,
            "function_declaration".into(),
            1,
            1,
            0,
            10,
            "export function add(a, b) { return a + b; }".into(),
            String::new(),
        );
        assert_eq!(chunk.id(), id);
    }

    #[test]
    fn signature_is_first_line() {
        let chunk = CodeChunk::new(
            "x".into(),
            "add".into(),
            Kind::Function,
            "a.ts".into(),
            SourceLang::Ts,
            "function_declaration".into(),
            1,
            3,
            0,
            10,
            "export function add(\n  a: number,\n  b: number\n) {}".into(),
            String::new(),
        );
        assert_eq!(chunk.signature(), "export function add(");
    }
}
