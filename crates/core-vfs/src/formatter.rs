//! Text rendering for listings and subtrees.
//!
//! Operates on the JSON shapes the daemon returns (`{name, kind}` child rows
//! and nested `{name, kind, children}` trees) so local and remote callers
//! render identically.

use serde_json::Value;

fn kind_suffix(kind: &str) -> &'static str {
    match kind {
        "dir" => "/",
        "leaf_bin" => "*",
        "alias" => "@",
        _ => "",
    }
}

/// Plain `ls`: one name per line, optional `-F` classify suffixes.
pub fn render_ls(children: &[Value], classify: bool) -> String {
    let mut lines = Vec::with_capacity(children.len());
    for child in children {
        let name = child["name"].as_str().unwrap_or_default();
        if classify {
            let kind = child["kind"].as_str().unwrap_or("leaf");
            lines.push(format!("{name}{}", kind_suffix(kind)));
        } else {
            lines.push(name.to_owned());
        }
    }
    lines.join("\n")
}

/// Long `ls`: TSV with a per-directory column schema. Missing cells render
/// as `-`.
pub fn render_ls_long(children: &[Value], columns: &[String], no_header: bool) -> String {
    let mut lines = Vec::new();
    if !no_header {
        lines.push(columns.join("\t"));
    }
    for child in children {
        let row: Vec<String> = columns
            .iter()
            .map(|col| {
                let key = col.to_ascii_lowercase();
                match child.get(&key) {
                    None | Some(Value::Null) => "-".to_owned(),
                    Some(Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                }
            })
            .collect();
        lines.push(row.join("\t"));
    }
    lines.join("\n")
}

fn render_tree_node(node: &Value, prefix: &str, depth: usize, max_depth: usize, out: &mut Vec<String>) {
    if depth >= max_depth {
        return;
    }
    let children = match node["children"].as_array() {
        Some(c) => c,
        None => return,
    };
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        let name = child["name"].as_str().unwrap_or_default();
        let kind = child["kind"].as_str().unwrap_or("leaf");
        out.push(format!("{prefix}{connector}{name}{}", kind_suffix(kind)));
        let continuation = if last { "    " } else { "│   " };
        render_tree_node(
            child,
            &format!("{prefix}{continuation}"),
            depth + 1,
            max_depth,
            out,
        );
    }
}

/// Box-drawing subtree rooted at `path`.
pub fn render_tree_root(path: &str, node: &Value, max_depth: usize) -> String {
    let kind = node["kind"].as_str().unwrap_or("leaf");
    let root_line = if kind == "dir" && path != "/" {
        format!("{path}/")
    } else {
        path.to_owned()
    };
    let mut lines = vec![root_line];
    render_tree_node(node, "", 0, max_depth, &mut lines);
    lines.join("\n")
}
