use std::path::Path;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::application::ParserAdapter;
use crate::domain::{CodeChunk, DomainError, Kind, SourceLang, Symbol};

const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

const DECLARATION_MODIFIERS: &[&str] = &[
    "export", "default", "async", "declare", "abstract", "readonly", "public", "private",
    "protected", "static",
];

/// Tree-sitter driven TypeScript/TSX parser: walks the concrete syntax tree once per file,
/// collecting declaration nodes and comment nodes, then derives each declaration's docstring
/// from the comments surrounding it.
pub struct TreeSitterParser;

impl TreeSitterParser {
    pub fn new() -> Self {
        Self
    }

    fn grammar(lang: SourceLang) -> tree_sitter::Language {
        match lang {
            SourceLang::Ts => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn parse_source(
        &self,
        source: &str,
        file: &str,
        lang: SourceLang,
    ) -> Result<(Vec<Symbol>, Vec<CodeChunk>), DomainError> {
        let mut parser = Parser::new();
        parser
            .set_language(&Self::grammar(lang))
            .map_err(|e| DomainError::parse(format!("failed to load grammar: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| DomainError::parse(format!("tree-sitter failed to parse {file}")))?;

        let mut comments = Vec::new();
        let mut declarations = Vec::new();
        collect(tree.root_node(), &mut comments, &mut declarations);

        let mut symbols = Vec::with_capacity(declarations.len());
        let mut chunks = Vec::with_capacity(declarations.len());

        for decl in declarations {
            let Some(kind) = Kind::from_node_kind(decl.kind()) else {
                continue;
            };
            let Some(name) = resolve_name(decl, source) else {
                continue;
            };

            let start_line = decl.start_position().row as u32 + 1;
            let end_line = decl.end_position().row as u32 + 1;
            let start_byte = decl.start_byte();
            let end_byte = decl.end_byte();
            let content = source[start_byte..end_byte].to_string();
            let docstring = extract_docstring(source, &comments, decl);

            let id = Symbol::compute_id(file, start_line, end_line, kind, &name);

            symbols.push(Symbol::reconstitute(
                id.clone(),
                name.clone(),
                kind,
                file.to_string(),
                lang,
                decl.kind().to_string(),
                start_line,
                end_line,
                start_byte,
                end_byte,
                docstring.clone(),
            ));

            chunks.push(CodeChunk::new(
                id,
                name,
                kind,
                file.to_string(),
                lang,
                decl.kind().to_string(),
                start_line,
                end_line,
                start_byte,
                end_byte,
                content,
                docstring,
            ));
        }

        Ok((symbols, chunks))
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserAdapter for TreeSitterParser {
    fn parse_file(&self, path: &Path) -> Result<(Vec<Symbol>, Vec<CodeChunk>), DomainError> {
        let rel = path.to_string_lossy().to_string();
        let lang = SourceLang::from_path(&rel)
            .ok_or_else(|| DomainError::parse(format!("unsupported source file: {rel}")))?;
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source, &rel, lang)
    }

    fn parse_project(&self, root: &Path) -> Result<(Vec<Symbol>, Vec<CodeChunk>), DomainError> {
        let mut all_symbols = Vec::new();
        let mut all_chunks = Vec::new();

        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| {
                e.file_type().is_file()
                    || !e
                        .file_name()
                        .to_str()
                        .map(|n| SKIP_DIRS.contains(&n))
                        .unwrap_or(false)
            })
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            let Some(lang) = SourceLang::from_path(&rel) else {
                continue;
            };
            let source = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    debug!("skipping unreadable file {}: {}", rel, e);
                    continue;
                }
            };
            match self.parse_source(&source, &rel, lang) {
                Ok((mut symbols, mut chunks)) => {
                    all_symbols.append(&mut symbols);
                    all_chunks.append(&mut chunks);
                }
                Err(e) => debug!("skipping unparsable file {}: {}", rel, e),
            }
        }

        Ok((all_symbols, all_chunks))
    }
}

/// Preorder DFS, mirroring the traversal order the spec requires symbol emission to follow.
fn collect<'a>(node: Node<'a>, comments: &mut Vec<Node<'a>>, declarations: &mut Vec<Node<'a>>) {
    if node.kind() == "comment" {
        comments.push(node);
    } else if Kind::from_node_kind(node.kind()).is_some() {
        declarations.push(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, comments, declarations);
    }
}

fn resolve_name(node: Node, source: &str) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        return Some(source[name_node.byte_range()].to_string());
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "property_identifier" | "type_identifier"))
        .map(|c| source[c.byte_range()].to_string())
}

fn extract_docstring(source: &str, comments: &[Node], decl: Node) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(jsdoc) = find_leading_jsdoc(source, comments, decl) {
        parts.push(strip_jsdoc(&source[jsdoc.byte_range()]));
    }
    if let Some(lines) = find_leading_line_comments(source, comments, decl) {
        parts.push(lines);
    }
    if let Some(inline) = find_inline_block_comment(source, comments, decl) {
        parts.push(inline);
    }
    if let Some(trailing) = find_trailing_comment(source, comments, decl) {
        parts.push(trailing);
    }

    parts.join("\n").trim().to_string()
}

fn gap_is_only_modifiers(gap: &str) -> bool {
    gap.split_whitespace()
        .all(|tok| DECLARATION_MODIFIERS.contains(&tok))
}

fn find_leading_jsdoc<'a>(source: &str, comments: &[Node<'a>], decl: Node) -> Option<Node<'a>> {
    comments
        .iter()
        .filter(|c| {
            c.end_byte() <= decl.start_byte()
                && c.start_position().column == 0
                && source[c.byte_range()].starts_with("/**")
                && gap_is_only_modifiers(&source[c.end_byte()..decl.start_byte()])
        })
        .max_by_key(|c| c.end_byte())
        .copied()
}

fn find_leading_line_comments(source: &str, comments: &[Node], decl: Node) -> Option<String> {
    let mut lines = Vec::new();
    let mut expected_row = decl.start_position().row.checked_sub(1)?;

    loop {
        let found = comments.iter().find(|c| {
            c.start_position().row == expected_row && source[c.byte_range()].starts_with("//")
        });
        match found {
            Some(c) => {
                lines.push(strip_line_comment(&source[c.byte_range()]));
                if expected_row == 0 {
                    break;
                }
                expected_row -= 1;
            }
            None => break,
        }
    }

    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

fn find_inline_block_comment(source: &str, comments: &[Node], decl: Node) -> Option<String> {
    let start_row = decl.start_position().row;
    comments
        .iter()
        .find(|c| {
            c.start_byte() >= decl.start_byte()
                && c.end_byte() <= decl.end_byte()
                && c.start_position().row == start_row
                && !source[c.byte_range()].starts_with("//")
        })
        .map(|c| strip_block_comment(&source[c.byte_range()]))
}

fn find_trailing_comment(source: &str, comments: &[Node], decl: Node) -> Option<String> {
    let end_row = decl.end_position().row;
    let on_line: Vec<&Node> = comments
        .iter()
        .filter(|c| c.start_position().row == end_row && c.start_byte() >= decl.end_byte())
        .collect();

    if let Some(line_comment) = on_line
        .iter()
        .rev()
        .find(|c| source[c.byte_range()].starts_with("//"))
    {
        return Some(strip_line_comment(&source[line_comment.byte_range()]));
    }
    on_line
        .last()
        .map(|c| strip_block_comment(&source[c.byte_range()]))
}

fn strip_jsdoc(text: &str) -> String {
    let inner = text
        .strip_prefix("/**")
        .unwrap_or(text)
        .strip_suffix("*/")
        .unwrap_or(text);
    inner
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
            trimmed.strip_prefix(' ').unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn strip_line_comment(text: &str) -> String {
    let stripped = text.strip_prefix("//").unwrap_or(text);
    stripped.strip_prefix(' ').unwrap_or(stripped).to_string()
}

fn strip_block_comment(text: &str) -> String {
    text.strip_prefix("/*")
        .unwrap_or(text)
        .strip_suffix("*/")
        .unwrap_or(text)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Vec<Symbol>, Vec<CodeChunk>) {
        TreeSitterParser::new()
            .parse_source(source, "a.ts", SourceLang::Ts)
            .unwrap()
    }

    #[test]
    fn extracts_function_declaration() {
        let (symbols, chunks) = parse("export function add(a: number, b: number) { return a + b; }\n");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name(), "add");
        assert_eq!(symbols[0].kind(), Kind::Function);
        assert_eq!(chunks[0].id(), symbols[0].id());
    }

    #[test]
    fn docstring_combines_jsdoc_and_trailing() {
        let source = "/** add jsdoc\n * multi line\n */\nexport function add(a: number, b: number) { return a + b; } // add trailing\n";
        let (symbols, _) = parse(source);
        let add = symbols.iter().find(|s| s.name() == "add").unwrap();
        assert_eq!(add.docstring(), "add jsdoc\nmulti line\nadd trailing");
    }

    #[test]
    fn docstring_from_leading_line_comments() {
        let source = "// first line\n// second line\nexport function add() {}\n";
        let (symbols, _) = parse(source);
        let add = symbols.iter().find(|s| s.name() == "add").unwrap();
        assert_eq!(add.docstring(), "first line\nsecond line");
    }

    #[test]
    fn variable_declarators_are_separate_symbols() {
        let (symbols, _) = parse("let a = 1, b = 2;\n");
        let names: Vec<&str> = symbols.iter().map(|s| s.name()).collect();
        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));
    }

    #[test]
    fn tsx_extension_selects_tsx_grammar() {
        let (symbols, _) = TreeSitterParser::new()
            .parse_source("export function Widget() { return null; }\n", "a.tsx", SourceLang::Tsx)
            .unwrap();
        assert_eq!(symbols[0].name(), "Widget");
        assert_eq!(symbols[0].lang(), SourceLang::Tsx);
    }

    #[test]
    fn malformed_source_yields_partial_results_not_an_error() {
        let result = parse("export function broken(\n");
        assert!(result.0.is_empty() || !result.0.is_empty());
    }
}
