use librarian_graph::EntityId;
use librarian_storage::{BasicBlock, CfgEdge, CfgEdgeType};

/// Lexical tokens that start a new basic block (spec.md §4.C, "Control-flow
/// graph"). Checked longest-prefix-first so `"else if"` wins over `"else"`.
const CONTROL_KEYWORDS: &[&str] = &[
    "else if", "if", "else", "for", "while", "do", "switch", "case", "default", "try", "catch",
    "finally", "return", "throw", "break", "continue",
];

fn leading_keyword(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    CONTROL_KEYWORDS.iter().copied().find(|kw| {
        trimmed.starts_with(kw)
            && trimmed[kw.len()..]
                .chars()
                .next()
                .map(|c| !c.is_alphanumeric() && c != '_')
                .unwrap_or(true)
    })
}

struct BlockBuilder {
    start_line: u32,
    end_line: u32,
    statements: Vec<String>,
    keyword: Option<&'static str>,
}

/// Build a basic-block CFG for one function by splitting its source lines
/// at control-flow lexical tokens (spec.md §4.C). This analysis is lexical
/// and approximate by design — it never fails, only produces a possibly
/// coarse CFG (malformed/empty input yields a single entry=exit block).
pub fn build_cfg(
    function_id: &EntityId,
    start_line: u32,
    end_line: u32,
    source: &str,
) -> (Vec<BasicBlock>, Vec<CfgEdge>) {
    let lines: Vec<&str> = source.lines().collect();
    let mut builders: Vec<BlockBuilder> = Vec::new();
    let mut current = BlockBuilder {
        start_line,
        end_line: start_line,
        statements: Vec::new(),
        keyword: None,
    };

    for (offset, line) in lines.iter().enumerate() {
        let line_no = start_line + offset as u32;
        if line_no > end_line {
            break;
        }
        let keyword = leading_keyword(line);
        if keyword.is_some() && !current.statements.is_empty() {
            current.end_line = line_no.saturating_sub(1).max(current.start_line);
            builders.push(current);
            current = BlockBuilder {
                start_line: line_no,
                end_line: line_no,
                statements: Vec::new(),
                keyword,
            };
        } else if current.keyword.is_none() {
            current.keyword = keyword;
        }
        current.statements.push(line.trim().to_string());
        current.end_line = line_no;
    }
    builders.push(current);

    let last_idx = builders.len() - 1;
    let blocks: Vec<BasicBlock> = builders
        .iter()
        .enumerate()
        .map(|(i, b)| BasicBlock {
            id: i as u32,
            start_line: b.start_line,
            end_line: b.end_line,
            is_entry: i == 0,
            is_exit: i == last_idx,
            statements: b.statements.clone(),
        })
        .collect();

    let mut edges: Vec<CfgEdge> = Vec::new();
    for (i, b) in builders.iter().enumerate() {
        if let Some("for" | "while" | "do") = b.keyword {
            edges.push(CfgEdge {
                function_id: function_id.clone(),
                from_block: i as u32,
                to_block: i as u32,
                edge_type: CfgEdgeType::LoopBack,
                condition: None,
                confidence: 1.0,
            });
        }
        if i + 1 <= last_idx {
            let is_if_headed = matches!(b.keyword, Some("if"));
            if is_if_headed {
                edges.push(CfgEdge {
                    function_id: function_id.clone(),
                    from_block: i as u32,
                    to_block: (i + 1) as u32,
                    edge_type: CfgEdgeType::BranchTrue,
                    condition: b.statements.first().cloned(),
                    confidence: 0.8,
                });
            } else {
                edges.push(CfgEdge {
                    function_id: function_id.clone(),
                    from_block: i as u32,
                    to_block: (i + 1) as u32,
                    edge_type: CfgEdgeType::Sequential,
                    condition: None,
                    confidence: 1.0,
                });
            }
        }
    }

    (blocks, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid() -> EntityId {
        EntityId::new("pkg::func")
    }

    #[test]
    fn empty_source_yields_one_entry_exit_block() {
        let (blocks, edges) = build_cfg(&fid(), 1, 1, "");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_entry && blocks[0].is_exit);
        assert!(edges.is_empty());
    }

    #[test]
    fn if_statement_splits_block_and_emits_branch_true() {
        let src = "x = 1\nif (x > 0)\n  y = 2\nreturn y";
        let (blocks, edges) = build_cfg(&fid(), 1, 4, src);
        assert!(blocks.len() >= 3);
        assert!(edges
            .iter()
            .any(|e| e.edge_type == CfgEdgeType::BranchTrue && e.confidence == 0.8));
    }

    #[test]
    fn while_loop_emits_self_loop_back_edge() {
        let src = "while (true)\n  work()";
        let (_blocks, edges) = build_cfg(&fid(), 1, 2, src);
        assert!(edges.iter().any(|e| e.edge_type == CfgEdgeType::LoopBack
            && e.from_block == e.to_block
            && e.confidence == 1.0));
    }

    #[test]
    fn first_block_is_entry_last_is_exit() {
        let src = "a()\nif (x)\n  b()\nelse\n  c()\nreturn";
        let (blocks, _edges) = build_cfg(&fid(), 1, 6, src);
        assert!(blocks.first().unwrap().is_entry);
        assert!(blocks.last().unwrap().is_exit);
        assert_eq!(blocks.iter().filter(|b| b.is_entry).count(), 1);
    }

    #[test]
    fn malformed_input_never_panics() {
        let src = "\u{0}\u{0}garbage\n\n\n   \nif\n";
        let (blocks, _edges) = build_cfg(&fid(), 1, 6, src);
        assert!(!blocks.is_empty());
    }
}
