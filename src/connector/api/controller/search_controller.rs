use anyhow::Result;

use crate::domain::{SemanticHit, SymbolHit};

use super::super::Container;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(
        &self,
        query: String,
        top_k: usize,
        symbol: bool,
        project: Option<String>,
    ) -> Result<String> {
        let _ = project; // single shared vector space today; kept for a future per-project scope.

        if symbol {
            let hits = self.container.symbol_store.find_by_name(&query).await?;
            return Ok(Self::format_symbol_hits(&hits.into_iter().map(SymbolHit::new).collect::<Vec<_>>()));
        }

        let hits = self.container.search_code.execute(&query, top_k).await?;
        Ok(Self::format_semantic_hits(&hits))
    }

    fn format_semantic_hits(hits: &[SemanticHit]) -> String {
        if hits.is_empty() {
            return "No results found.".to_string();
        }

        let mut output = format!("Found {} results:\n\n", hits.len());
        for (i, hit) in hits.iter().enumerate() {
            let chunk = hit.chunk();
            output.push_str(&format!(
                "{}. {}:{}-{} (score: {:.3})\n   {} {}\n",
                i + 1,
                chunk.file(),
                chunk.start_line(),
                chunk.end_line(),
                hit.score(),
                chunk.kind(),
                chunk.name(),
            ));
            let preview: String = chunk
                .content()
                .lines()
                .take(10)
                .map(|l| format!("   | {l}"))
                .collect::<Vec<_>>()
                .join("\n");
            output.push_str(&preview);
            output.push_str("\n\n");
        }
        output
    }

    fn format_symbol_hits(hits: &[SymbolHit]) -> String {
        if hits.is_empty() {
            return "No symbols found.".to_string();
        }

        let mut output = format!("Found {} symbols:\n\n", hits.len());
        for (i, hit) in hits.iter().enumerate() {
            let symbol = hit.symbol();
            output.push_str(&format!(
                "{}. {} {} — {}:{}-{}\n",
                i + 1,
                symbol.kind(),
                symbol.name(),
                symbol.file(),
                symbol.start_line(),
                symbol.end_line(),
            ));
        }
        output
    }
}
