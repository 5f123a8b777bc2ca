//! Newick parser.
//!
//! Parsing happens in two passes over the trimmed input:
//!
//! 1. **Scan:** one left-to-right pass that tracks quotes and bracketed
//!    comments, drops the comments, checks parenthesis balance, rejects a
//!    `(` in label position and stops at the terminating `;`. Every
//!    structural error is reported here with its byte offset.
//! 2. **Descent:** recursive descent over the cleaned body. A substring that
//!    starts with `(` is an internal node: its children are the top-level
//!    comma-separated parts up to the matching `)`, and what follows is its
//!    `name[:length]`. Anything else is a leaf label.
//!
//! Supported: quoted labels (`'...'` with `''` escapes, `"..."`), missing
//! branch lengths, unnamed nodes, nesting of any depth.

use petgraph::stable_graph::NodeIndex;

use super::hierarchy::PhyloTree;
use super::node::TreeNode;
use crate::error::TreeParseError;

/// Id used for the root when it has no label.
pub const ROOT_ID: &str = "root";

/// Parse one Newick tree, optionally terminated by `;`.
pub fn parse(newick: &str) -> Result<PhyloTree, TreeParseError> {
    let text = newick.trim();
    if text.is_empty() {
        return Err(TreeParseError::Empty);
    }

    let body = scan(text)?;
    if body.trim().is_empty() {
        return Err(TreeParseError::Empty);
    }

    let mut tree: Option<PhyloTree> = None;
    parse_subtree(&mut tree, &body, body.trim(), None, ROOT_ID.to_string(), 0)?;
    tree.ok_or(TreeParseError::Empty)
}

// ============================================================================
// Scan
// ============================================================================

/// Validate structure and return the body with comments removed.
fn scan(text: &str) -> Result<String, TreeParseError> {
    let mut body = String::with_capacity(text.len());
    let mut open_parens: Vec<usize> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut comment_start: Option<usize> = None;
    // Last significant character outside quotes and comments.
    let mut previous: Option<char> = None;

    let mut chars = text.char_indices().peekable();
    while let Some((position, ch)) = chars.next() {
        if let Some((delimiter, _)) = quote {
            body.push(ch);
            if ch == delimiter {
                match chars.peek() {
                    Some(&(_, next)) if delimiter == '\'' && next == '\'' => {
                        body.push(next);
                        chars.next();
                    }
                    _ => quote = None,
                }
            }
            continue;
        }

        if comment_start.is_some() {
            if ch == ']' {
                comment_start = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => {
                quote = Some((ch, position));
                previous = Some(ch);
                body.push(ch);
            }
            '[' => comment_start = Some(position),
            ']' => return Err(TreeParseError::UnexpectedCharacter { found: ch, position }),
            '(' => {
                if matches!(previous, Some(p) if p != '(' && p != ',') {
                    return Err(TreeParseError::UnexpectedCharacter { found: ch, position });
                }
                open_parens.push(position);
                previous = Some(ch);
                body.push(ch);
            }
            ')' => {
                if open_parens.pop().is_none() {
                    return Err(TreeParseError::UnbalancedParentheses { position });
                }
                previous = Some(ch);
                body.push(ch);
            }
            ',' if open_parens.is_empty() => {
                return Err(TreeParseError::UnexpectedCharacter { found: ch, position });
            }
            ';' => {
                if let Some(&open) = open_parens.last() {
                    return Err(TreeParseError::UnbalancedParentheses { position: open });
                }
                let rest = &text[position + 1..];
                if let Some(offset) = rest.find(|c: char| !c.is_whitespace()) {
                    return Err(TreeParseError::TrailingContent {
                        position: position + 1 + offset,
                    });
                }
                return Ok(body);
            }
            _ => {
                if !ch.is_whitespace() {
                    previous = Some(ch);
                }
                body.push(ch);
            }
        }
    }

    if let Some((_, start)) = quote {
        return Err(TreeParseError::UnterminatedQuote { position: start });
    }
    if let Some(start) = comment_start {
        return Err(TreeParseError::UnexpectedCharacter { found: '[', position: start });
    }
    if let Some(&open) = open_parens.last() {
        return Err(TreeParseError::UnbalancedParentheses { position: open });
    }
    Ok(body)
}

// ============================================================================
// Descent
// ============================================================================

/// `source` is the whole cleaned body; `text` is a slice of it.
fn parse_subtree(
    tree: &mut Option<PhyloTree>,
    source: &str,
    text: &str,
    parent: Option<NodeIndex>,
    path_id: String,
    depth: u32,
) -> Result<NodeIndex, TreeParseError> {
    let text = text.trim();

    let (children_text, label_text) = if text.starts_with('(') {
        let close = matching_close(text)?;
        (Some(&text[1..close]), &text[close + 1..])
    } else {
        (None, text)
    };

    if let Some((offset, found)) = stray_structure(label_text) {
        return Err(TreeParseError::UnexpectedCharacter {
            found,
            position: offset_in(source, label_text) + offset,
        });
    }
    let (name, branch_length) = split_label(label_text);

    let index = match parent {
        Some(parent) => {
            let Some(tree) = tree.as_mut() else {
                return Err(TreeParseError::Empty);
            };
            let id = tree.unique_id(&name, &path_id);
            tree.add_child(parent, TreeNode::new(id, name, branch_length, depth))
        }
        None => {
            let id = if name.is_empty() { path_id } else { name.clone() };
            let built = tree.insert(PhyloTree::with_root(TreeNode::new(
                id,
                name,
                branch_length,
                depth,
            )));
            built.root()
        }
    };

    if let Some(children_text) = children_text {
        let parent_id = tree
            .as_ref()
            .map(|tree| tree.node(index).id.clone())
            .unwrap_or_default();
        for (child_index, child_text) in split_top_level(children_text).into_iter().enumerate() {
            parse_subtree(
                tree,
                source,
                child_text,
                Some(index),
                format!("{parent_id}_{child_index}"),
                depth + 1,
            )?;
        }
    }

    Ok(index)
}

/// Byte index of the `)` that closes the `(` at the start of `text`.
fn matching_close(text: &str) -> Result<usize, TreeParseError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (position, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(delimiter), _) if ch == delimiter => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(position);
                }
            }
            _ => {}
        }
    }
    Err(TreeParseError::UnbalancedParentheses { position: 0 })
}

/// First unquoted `,`, `(` or `)` in a label, with its byte offset.
fn stray_structure(label: &str) -> Option<(usize, char)> {
    let mut quote: Option<char> = None;
    for (position, ch) in label.char_indices() {
        match (quote, ch) {
            (Some(delimiter), _) if ch == delimiter => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ',' | '(' | ')') => return Some((position, ch)),
            _ => {}
        }
    }
    None
}

/// Byte offset of `part` within `source`, which it must be a slice of.
fn offset_in(source: &str, part: &str) -> usize {
    (part.as_ptr() as usize).saturating_sub(source.as_ptr() as usize)
}

/// Split on commas that are neither nested nor quoted.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (position, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(delimiter), _) if ch == delimiter => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&text[start..position]);
                start = position + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split `name[:length]` on the first unquoted colon.
///
/// A length that does not parse to a finite number is dropped.
fn split_label(text: &str) -> (String, Option<f64>) {
    let mut quote: Option<char> = None;
    let mut colon = None;
    for (position, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(delimiter), _) if ch == delimiter => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ':') => {
                colon = Some(position);
                break;
            }
            _ => {}
        }
    }

    match colon {
        Some(position) => {
            let length = text[position + 1..]
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|length| length.is_finite());
            (unquote(text[..position].trim()), length)
        }
        None => (unquote(text.trim()), None),
    }
}

fn unquote(label: &str) -> String {
    let mut chars = label.chars();
    match (chars.next(), chars.next_back()) {
        (Some('\''), Some('\'')) => label[1..label.len() - 1].replace("''", "'"),
        (Some('"'), Some('"')) => label[1..label.len() - 1].to_string(),
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_names(tree: &PhyloTree) -> Vec<String> {
        tree.leaves()
            .into_iter()
            .map(|index| tree.node(index).name.clone())
            .collect()
    }

    /// Every comma adds exactly one leaf, so a well-formed tree has
    /// `commas + 1` leaves.
    fn naive_leaf_count(newick: &str) -> usize {
        newick.chars().filter(|&c| c == ',').count() + 1
    }

    #[test]
    fn test_example_tree() {
        let tree = parse("((A:0.1,B:0.2):0.3,C:0.4);").unwrap();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(leaf_names(&tree), vec!["A", "B", "C"]);

        let root = tree.node(tree.root());
        assert_eq!(root.id, "root");
        assert_eq!(root.depth, 0);
        assert_eq!(root.branch_length, None);

        let inner = tree.find("root_0").expect("unnamed internal node gets a path id");
        assert_eq!(tree.node(inner).branch_length, Some(0.3));
        assert_eq!(tree.node(inner).depth, 1);

        let b = tree.find("B").unwrap();
        assert_eq!(tree.node(b).branch_length, Some(0.2));
        assert_eq!(tree.node(b).depth, 2);
        assert_eq!(tree.parent(b), Some(inner));
    }

    #[test]
    fn test_leaf_count_matches_naive_count() {
        let mut inputs: Vec<String> = vec![
            "A;".into(),
            "(A,B);".into(),
            "((A,B),(C,D));".into(),
            "(((A,B),C),(D,(E,F,G)));".into(),
            "(,,(,));".into(),
            "((A:1,B:2)AB:3,(C:1)D:2)root:0;".into(),
        ];

        // Caterpillar 300 levels deep
        let mut caterpillar = String::from("L0");
        for i in 1..300 {
            caterpillar = format!("({caterpillar},L{i})");
        }
        inputs.push(format!("{caterpillar};"));

        for input in &inputs {
            let tree = parse(input).unwrap();
            assert_eq!(
                tree.leaf_count(),
                naive_leaf_count(input),
                "leaf count mismatch for {input:.40}"
            );
        }
    }

    #[test]
    fn test_deep_nesting_depths() {
        let mut newick = String::from("X");
        for _ in 0..500 {
            newick = format!("({newick})");
        }
        let tree = parse(&newick).unwrap();
        let x = tree.find("X").unwrap();
        assert_eq!(tree.node(x).depth, 500);
        assert_eq!(tree.max_depth(), 500);
    }

    #[test]
    fn test_quoted_names() {
        let tree = parse("('Homo sapiens':0.1,'O''Brien, sp.':0.2,\"Mus (mouse)\");").unwrap();
        assert_eq!(
            leaf_names(&tree),
            vec!["Homo sapiens", "O'Brien, sp.", "Mus (mouse)"]
        );
        assert!(tree.find("Homo sapiens").is_some());
        let quoted = tree.find("O'Brien, sp.").unwrap();
        assert_eq!(tree.node(quoted).branch_length, Some(0.2));
    }

    #[test]
    fn test_missing_and_invalid_lengths() {
        let tree = parse("(A,B:,C:abc,D:1e-3,E:NaN);").unwrap();
        let length = |id: &str| tree.node(tree.find(id).unwrap()).branch_length;
        assert_eq!(length("A"), None);
        assert_eq!(length("B"), None);
        assert_eq!(length("C"), None);
        assert_eq!(length("D"), Some(1e-3));
        assert_eq!(length("E"), None);
    }

    #[test]
    fn test_unnamed_nodes_get_path_ids() {
        let tree = parse("((,A),(B,));").unwrap();
        for id in ["root", "root_0", "root_0_0", "A", "root_1", "B", "root_1_1"] {
            assert!(tree.find(id).is_some(), "missing id {id}");
        }
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn test_named_internal_and_root() {
        let tree = parse("((A,B)Brassicaceae:0.5,C)Eudicots;").unwrap();
        let root = tree.node(tree.root());
        assert_eq!(root.id, "Eudicots");
        assert_eq!(root.name, "Eudicots");
        let clade = tree.find("Brassicaceae").unwrap();
        assert_eq!(tree.children(clade).len(), 2);
        assert_eq!(tree.node(clade).branch_length, Some(0.5));
    }

    #[test]
    fn test_duplicate_labels_stay_unique() {
        let tree = parse("((A,A),A);").unwrap();
        assert_eq!(tree.leaf_count(), 3);
        let mut ids: Vec<String> = tree
            .leaves()
            .into_iter()
            .map(|index| tree.node(index).id.clone())
            .collect();
        assert_eq!(ids[0], "A");
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3, "leaf ids must be unique: {ids:?}");
    }

    #[test]
    fn test_whitespace_and_missing_semicolon() {
        let tree = parse("  \n( A : 0.1 , B )  ").unwrap();
        assert_eq!(leaf_names(&tree), vec!["A", "B"]);
        assert_eq!(tree.node(tree.find("A").unwrap()).branch_length, Some(0.1));
    }

    #[test]
    fn test_comments_are_ignored() {
        let tree = parse("((A[&&NHX:S=human]:0.1,B)[100]:0.2,C[comment]);").unwrap();
        assert_eq!(leaf_names(&tree), vec!["A", "B", "C"]);
        assert_eq!(tree.node(tree.find("A").unwrap()).branch_length, Some(0.1));
        assert_eq!(tree.node(tree.find("root_0").unwrap()).branch_length, Some(0.2));
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = parse("Arabidopsis_thaliana;").unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node(tree.root()).id, "Arabidopsis_thaliana");
    }

    #[test]
    fn test_errors() {
        let error = |newick: &str| parse(newick).err();

        assert_eq!(error(""), Some(TreeParseError::Empty));
        assert_eq!(error("   "), Some(TreeParseError::Empty));
        assert_eq!(error(";"), Some(TreeParseError::Empty));
        assert_eq!(
            error("((A,B);"),
            Some(TreeParseError::UnbalancedParentheses { position: 0 })
        );
        assert_eq!(
            error("(A,B));"),
            Some(TreeParseError::UnbalancedParentheses { position: 5 })
        );
        assert_eq!(
            error("((A,B),C"),
            Some(TreeParseError::UnbalancedParentheses { position: 0 })
        );
        assert_eq!(
            error("(A,B);(C,D);"),
            Some(TreeParseError::TrailingContent { position: 6 })
        );
        assert_eq!(
            error("(A,'B);"),
            Some(TreeParseError::UnterminatedQuote { position: 3 })
        );
        assert_eq!(
            error("(A)(B);"),
            Some(TreeParseError::UnexpectedCharacter { found: '(', position: 3 })
        );
        assert_eq!(
            error("(A,B]);"),
            Some(TreeParseError::UnexpectedCharacter { found: ']', position: 4 })
        );
    }

    #[test]
    fn test_top_level_siblings_are_rejected() {
        let error = |newick: &str| parse(newick).err();

        assert_eq!(
            error("(A,B),C;"),
            Some(TreeParseError::UnexpectedCharacter { found: ',', position: 5 })
        );
        assert_eq!(
            error("(A,B)C,(D,E);"),
            Some(TreeParseError::UnexpectedCharacter { found: ',', position: 6 })
        );
        assert_eq!(
            error("A,B;"),
            Some(TreeParseError::UnexpectedCharacter { found: ',', position: 1 })
        );
        // Quoted commas are part of the label
        let tree = parse("'A,B';").unwrap();
        assert_eq!(tree.node(tree.root()).name, "A,B");
    }

    #[test]
    fn test_stray_structure_in_label() {
        assert_eq!(stray_structure("Homo_sapiens:0.1"), None);
        assert_eq!(stray_structure("'Mus (mouse), sp.'"), None);
        assert_eq!(stray_structure("C,(D,E)"), Some((1, ',')));
        assert_eq!(stray_structure("X)"), Some((1, ')')));

        let source = "(A,B)C,D";
        assert_eq!(offset_in(source, &source[5..]), 5);
    }

    #[test]
    fn test_reparse_is_fresh() {
        let newick = "((A:0.1,B:0.2):0.3,C:0.4);";
        let first = parse(newick).unwrap();
        let second = parse(newick).unwrap();
        assert_eq!(first.to_view(), second.to_view());
    }
}
