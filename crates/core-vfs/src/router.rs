//! Path → (kind, handler, args) resolution.
//!
//! Pure syntax: the router accepts any well-formed path whether or not the
//! node currently exists in the tree. Numeric components must parse as u64;
//! `..` and empty interior segments reject; trailing slashes are trimmed
//! before resolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use core_pipeline::Section;
use core_replay::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Dir,
    Leaf,
    LeafBin,
    Alias,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Dir => "dir",
            NodeKind::Leaf => "leaf",
            NodeKind::LeafBin => "leaf_bin",
            NodeKind::Alias => "alias",
        }
    }

    /// `ls -F` style suffix.
    pub fn classify_suffix(self) -> &'static str {
        match self {
            NodeKind::Dir => "/",
            NodeKind::Leaf => "",
            NodeKind::LeafBin => "*",
            NodeKind::Alias => "@",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch {
    pub kind: NodeKind,
    /// RPC method producing this node's content; `None` for plain dirs.
    pub handler: Option<&'static str>,
    pub args: Map<String, Value>,
}

impl PathMatch {
    fn dir(args: Map<String, Value>) -> Option<Self> {
        Some(Self {
            kind: NodeKind::Dir,
            handler: None,
            args,
        })
    }

    fn leaf(handler: &'static str, args: Map<String, Value>) -> Option<Self> {
        Some(Self {
            kind: NodeKind::Leaf,
            handler: Some(handler),
            args,
        })
    }

    fn leaf_bin(handler: &'static str, args: Map<String, Value>) -> Option<Self> {
        Some(Self {
            kind: NodeKind::LeafBin,
            handler: Some(handler),
            args,
        })
    }
}

fn args0() -> Map<String, Value> {
    Map::new()
}

fn args1(key: &str, value: Value) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(key.to_owned(), value);
    m
}

fn args2(k1: &str, v1: Value, k2: &str, v2: Value) -> Map<String, Value> {
    let mut m = args1(k1, v1);
    m.insert(k2.to_owned(), v2);
    m
}

fn parse_u64(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `color<k>.png` → k
fn parse_color_target(s: &str) -> Option<u64> {
    let rest = s.strip_prefix("color")?.strip_suffix(".png")?;
    parse_u64(rest)
}

/// `<k>.png` → k
fn parse_mip_png(s: &str) -> Option<u64> {
    parse_u64(s.strip_suffix(".png")?)
}

fn resolve_draw_subpath(eid: u64, rest: &[&str]) -> Option<PathMatch> {
    let eid_args = args1("eid", Value::from(eid));
    match rest {
        [] => PathMatch::dir(eid_args),
        ["pipeline"] => PathMatch::dir(eid_args),
        ["pipeline", "summary"] => {
            PathMatch::leaf("pipeline", args2("eid", Value::from(eid), "section", Value::Null))
        }
        ["pipeline", section] => {
            let section = Section::parse(section)?;
            PathMatch::leaf(section.method_name(), eid_args)
        }
        ["shader"] => PathMatch::dir(eid_args),
        ["shader", stage] => {
            Stage::parse(stage)?;
            PathMatch::dir(args2(
                "eid",
                Value::from(eid),
                "stage",
                Value::from(*stage),
            ))
        }
        ["shader", stage, leaf] => {
            Stage::parse(stage)?;
            let handler = match *leaf {
                "disasm" => "shader_disasm",
                "source" => "shader_source",
                "reflect" => "shader_reflect",
                "constants" => "shader_constants",
                _ => return None,
            };
            PathMatch::leaf(
                handler,
                args2("eid", Value::from(eid), "stage", Value::from(*stage)),
            )
        }
        ["bindings"] => PathMatch::dir(eid_args),
        ["cbuffer"] => PathMatch::dir(eid_args),
        ["cbuffer", set] => {
            let set = parse_u64(set)?;
            PathMatch::dir(args2("eid", Value::from(eid), "set", Value::from(set)))
        }
        ["cbuffer", set, binding] => {
            let set = parse_u64(set)?;
            let binding = parse_u64(binding)?;
            let mut args = args2("eid", Value::from(eid), "set", Value::from(set));
            args.insert("binding".to_owned(), Value::from(binding));
            PathMatch::leaf("cbuffer_decode", args)
        }
        ["vbuffer"] => PathMatch::leaf("vbuffer_decode", eid_args),
        ["ibuffer"] => PathMatch::leaf("ibuffer_decode", eid_args),
        ["postvs"] => PathMatch::leaf("postvs", eid_args),
        ["descriptors"] => PathMatch::leaf("descriptors", eid_args),
        ["targets"] => PathMatch::dir(eid_args),
        ["targets", "depth.png"] => PathMatch::leaf_bin("rt_depth", eid_args),
        ["targets", name] => {
            let target = parse_color_target(name)?;
            PathMatch::leaf_bin(
                "rt_export",
                args2("eid", Value::from(eid), "target", Value::from(target)),
            )
        }
        _ => None,
    }
}

/// Resolve a VFS path. `None` means the path cannot exist.
pub fn resolve_path(path: &str) -> Option<PathMatch> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return PathMatch::dir(args0());
    }
    let body = trimmed.strip_prefix('/')?;
    let segments: Vec<&str> = body.split('/').collect();
    if segments.iter().any(|s| s.is_empty() || *s == "..") {
        return None;
    }

    match segments.as_slice() {
        ["info"] | ["capabilities"] => PathMatch::leaf("info", args0()),
        ["stats"] => PathMatch::leaf("stats", args0()),
        ["log"] => PathMatch::leaf("log", args0()),
        ["current"] => Some(PathMatch {
            kind: NodeKind::Alias,
            handler: None,
            args: args0(),
        }),

        ["events"] => PathMatch::dir(args0()),
        ["events", eid] => {
            let eid = parse_u64(eid)?;
            PathMatch::leaf("event", args1("eid", Value::from(eid)))
        }

        ["draws"] => PathMatch::dir(args0()),
        ["draws", eid, rest @ ..] => resolve_draw_subpath(parse_u64(eid)?, rest),

        ["passes"] => PathMatch::dir(args0()),
        ["passes", name] => PathMatch::dir(args1("name", Value::from(*name))),
        ["passes", name, "info"] => PathMatch::leaf("pass", args1("name", Value::from(*name))),
        ["passes", name, "draws"] => PathMatch::dir(args1("name", Value::from(*name))),
        ["passes", name, "draws", eid] => {
            let eid = parse_u64(eid)?;
            let mut args = args1("name", Value::from(*name));
            args.insert("eid".to_owned(), Value::from(eid));
            PathMatch::leaf("draw", args)
        }
        ["passes", name, "attachments"] => PathMatch::dir(args1("name", Value::from(*name))),

        ["resources"] => PathMatch::dir(args0()),
        ["resources", id] => PathMatch::dir(args1("id", Value::from(parse_u64(id)?))),
        ["resources", id, "info"] => {
            PathMatch::leaf("resource", args1("id", Value::from(parse_u64(id)?)))
        }
        ["resources", id, "usage"] => {
            PathMatch::leaf("usage", args1("id", Value::from(parse_u64(id)?)))
        }

        ["textures"] => PathMatch::dir(args0()),
        ["textures", id] => PathMatch::dir(args1("id", Value::from(parse_u64(id)?))),
        ["textures", id, "info"] => {
            PathMatch::leaf("tex_info", args1("id", Value::from(parse_u64(id)?)))
        }
        ["textures", id, "image.png"] => {
            PathMatch::leaf_bin("tex_export", args1("id", Value::from(parse_u64(id)?)))
        }
        ["textures", id, "mips"] => PathMatch::dir(args1("id", Value::from(parse_u64(id)?))),
        ["textures", id, "mips", mip] => {
            let id = parse_u64(id)?;
            let mip = parse_mip_png(mip)?;
            PathMatch::leaf_bin(
                "tex_export",
                args2("id", Value::from(id), "mip", Value::from(mip)),
            )
        }
        ["textures", id, "data"] => {
            PathMatch::leaf_bin("tex_raw", args1("id", Value::from(parse_u64(id)?)))
        }

        ["buffers"] => PathMatch::dir(args0()),
        ["buffers", id] => PathMatch::dir(args1("id", Value::from(parse_u64(id)?))),
        ["buffers", id, "info"] => {
            PathMatch::leaf("buf_info", args1("id", Value::from(parse_u64(id)?)))
        }
        ["buffers", id, "data"] => {
            PathMatch::leaf_bin("buf_raw", args1("id", Value::from(parse_u64(id)?)))
        }

        ["shaders"] => PathMatch::dir(args0()),
        ["shaders", sid] => PathMatch::dir(args1("id", Value::from(parse_u64(sid)?))),
        ["shaders", sid, "info"] => {
            PathMatch::leaf("shader_list_info", args1("id", Value::from(parse_u64(sid)?)))
        }
        ["shaders", sid, "disasm"] => PathMatch::leaf(
            "shader_list_disasm",
            args1("id", Value::from(parse_u64(sid)?)),
        ),

        ["counters"] => PathMatch::dir(args0()),
        ["counters", "list"] => PathMatch::leaf("counter_list", args0()),

        // Marker groups nest by path segment; a numeric tail is a draw.
        ["by-marker", rest @ ..] => match rest.last() {
            Some(last) => match parse_u64(last) {
                Some(eid) => PathMatch::leaf("draw", args1("eid", Value::from(eid))),
                None => PathMatch::dir(args0()),
            },
            None => PathMatch::dir(args0()),
        },

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args_of(m: &PathMatch) -> Value {
        Value::Object(m.args.clone())
    }

    #[test]
    fn root_and_top_level_leaves() {
        let m = resolve_path("/").unwrap();
        assert_eq!(m.kind, NodeKind::Dir);
        assert_eq!(m.handler, None);

        for (path, handler) in [
            ("/info", "info"),
            ("/capabilities", "info"),
            ("/stats", "stats"),
            ("/log", "log"),
        ] {
            let m = resolve_path(path).unwrap();
            assert_eq!(m.kind, NodeKind::Leaf, "{path}");
            assert_eq!(m.handler, Some(handler), "{path}");
        }
    }

    #[test]
    fn events_routes() {
        assert_eq!(resolve_path("/events").unwrap().kind, NodeKind::Dir);
        let m = resolve_path("/events/42").unwrap();
        assert_eq!(m.handler, Some("event"));
        assert_eq!(args_of(&m), json!({"eid": 42}));
        assert!(args_of(&m)["eid"].is_u64());
    }

    #[test]
    fn draw_dir_and_pipeline() {
        let m = resolve_path("/draws/142").unwrap();
        assert_eq!(m.kind, NodeKind::Dir);
        assert_eq!(args_of(&m), json!({"eid": 142}));

        let m = resolve_path("/draws/142/pipeline/summary").unwrap();
        assert_eq!(m.handler, Some("pipeline"));
        assert_eq!(args_of(&m), json!({"eid": 142, "section": null}));

        assert!(resolve_path("/draws/142/pipeline/bad").is_none());
        assert!(resolve_path("/draws/142/pipeline/ia").is_none());
    }

    #[test]
    fn pipeline_sections_route_to_pipe_methods() {
        for (sub, handler) in [
            ("topology", "pipe_topology"),
            ("viewport", "pipe_viewport"),
            ("scissor", "pipe_scissor"),
            ("blend", "pipe_blend"),
            ("stencil", "pipe_stencil"),
            ("vertex-inputs", "pipe_vinputs"),
            ("samplers", "pipe_samplers"),
            ("vbuffers", "pipe_vbuffers"),
            ("ibuffer", "pipe_ibuffer"),
            ("push-constants", "pipe_push_constants"),
            ("rasterizer", "pipe_rasterizer"),
            ("depth-stencil", "pipe_depth_stencil"),
            ("msaa", "pipe_msaa"),
        ] {
            let m = resolve_path(&format!("/draws/42/pipeline/{sub}")).unwrap();
            assert_eq!(m.handler, Some(handler), "{sub}");
            assert_eq!(args_of(&m)["eid"], json!(42));
        }
    }

    #[test]
    fn shader_routes_for_every_stage_and_leaf() {
        let m = resolve_path("/draws/142/shader").unwrap();
        assert_eq!(m.kind, NodeKind::Dir);

        for stage in ["vs", "hs", "ds", "gs", "ps", "cs"] {
            let m = resolve_path(&format!("/draws/142/shader/{stage}")).unwrap();
            assert_eq!(m.kind, NodeKind::Dir);
            assert_eq!(args_of(&m), json!({"eid": 142, "stage": stage}));
            for (leaf, handler) in [
                ("disasm", "shader_disasm"),
                ("source", "shader_source"),
                ("reflect", "shader_reflect"),
                ("constants", "shader_constants"),
            ] {
                let m = resolve_path(&format!("/draws/142/shader/{stage}/{leaf}")).unwrap();
                assert_eq!(m.kind, NodeKind::Leaf);
                assert_eq!(m.handler, Some(handler));
                assert_eq!(args_of(&m)["stage"], json!(stage));
            }
        }
        assert!(resolve_path("/draws/142/shader/xx").is_none());
        assert!(resolve_path("/draws/142/shader/ps/nonexistent").is_none());
    }

    #[test]
    fn buffer_decode_routes() {
        let m = resolve_path("/draws/42/cbuffer").unwrap();
        assert_eq!(m.kind, NodeKind::Dir);
        assert_eq!(args_of(&m)["eid"], json!(42));

        let m = resolve_path("/draws/42/cbuffer/0/3").unwrap();
        assert_eq!(m.kind, NodeKind::Leaf);
        assert_eq!(m.handler, Some("cbuffer_decode"));
        assert_eq!(args_of(&m), json!({"eid": 42, "set": 0, "binding": 3}));

        let m = resolve_path("/draws/42/vbuffer").unwrap();
        assert_eq!(m.handler, Some("vbuffer_decode"));
        let m = resolve_path("/draws/42/ibuffer").unwrap();
        assert_eq!(m.handler, Some("ibuffer_decode"));
        let m = resolve_path("/draws/42/postvs").unwrap();
        assert_eq!(m.handler, Some("postvs"));
    }

    #[test]
    fn descriptors_route() {
        let m = resolve_path("/draws/42/descriptors").unwrap();
        assert_eq!(m.kind, NodeKind::Leaf);
        assert_eq!(m.handler, Some("descriptors"));
        assert_eq!(args_of(&m), json!({"eid": 42}));
    }

    #[test]
    fn passes_routes() {
        assert_eq!(resolve_path("/passes").unwrap().kind, NodeKind::Dir);
        let m = resolve_path("/passes/GBuffer").unwrap();
        assert_eq!(args_of(&m), json!({"name": "GBuffer"}));
        let m = resolve_path("/passes/GBuffer/info").unwrap();
        assert_eq!(m.handler, Some("pass"));
        assert_eq!(resolve_path("/passes/Shadow/draws").unwrap().kind, NodeKind::Dir);
        assert_eq!(
            resolve_path("/passes/Shadow/attachments").unwrap().kind,
            NodeKind::Dir
        );
        let m = resolve_path("/passes/Main-Pass_01/info").unwrap();
        assert_eq!(args_of(&m)["name"], json!("Main-Pass_01"));
    }

    #[test]
    fn resources_routes() {
        let m = resolve_path("/resources/88/info").unwrap();
        assert_eq!(m.handler, Some("resource"));
        assert!(args_of(&m)["id"].is_u64());
        let m = resolve_path("/resources/97/usage").unwrap();
        assert_eq!(m.handler, Some("usage"));
    }

    #[test]
    fn texture_routes() {
        assert_eq!(resolve_path("/textures/42").unwrap().kind, NodeKind::Dir);
        let m = resolve_path("/textures/42/info").unwrap();
        assert_eq!(m.handler, Some("tex_info"));
        let m = resolve_path("/textures/42/image.png").unwrap();
        assert_eq!(m.kind, NodeKind::LeafBin);
        assert_eq!(m.handler, Some("tex_export"));
        for mip in [0u64, 3] {
            let m = resolve_path(&format!("/textures/42/mips/{mip}.png")).unwrap();
            assert_eq!(m.kind, NodeKind::LeafBin);
            assert_eq!(args_of(&m), json!({"id": 42, "mip": mip}));
        }
        let m = resolve_path("/textures/42/data").unwrap();
        assert_eq!(m.kind, NodeKind::LeafBin);
        assert_eq!(m.handler, Some("tex_raw"));
    }

    #[test]
    fn buffer_routes() {
        let m = resolve_path("/buffers/7/info").unwrap();
        assert_eq!(m.handler, Some("buf_info"));
        let m = resolve_path("/buffers/7/data").unwrap();
        assert_eq!(m.kind, NodeKind::LeafBin);
        assert_eq!(m.handler, Some("buf_raw"));
    }

    #[test]
    fn target_routes() {
        assert_eq!(resolve_path("/draws/142/targets").unwrap().kind, NodeKind::Dir);
        for target in [0u64, 3] {
            let m = resolve_path(&format!("/draws/142/targets/color{target}.png")).unwrap();
            assert_eq!(m.kind, NodeKind::LeafBin);
            assert_eq!(m.handler, Some("rt_export"));
            assert_eq!(args_of(&m), json!({"eid": 142, "target": target}));
        }
        let m = resolve_path("/draws/142/targets/depth.png").unwrap();
        assert_eq!(m.handler, Some("rt_depth"));
    }

    #[test]
    fn shaders_and_counters() {
        assert_eq!(resolve_path("/shaders").unwrap().kind, NodeKind::Dir);
        let m = resolve_path("/shaders/100/info").unwrap();
        assert_eq!(m.handler, Some("shader_list_info"));
        let m = resolve_path("/shaders/100/disasm").unwrap();
        assert_eq!(m.handler, Some("shader_list_disasm"));
        assert_eq!(resolve_path("/counters").unwrap().kind, NodeKind::Dir);
        let m = resolve_path("/counters/list").unwrap();
        assert_eq!(m.handler, Some("counter_list"));
    }

    #[test]
    fn alias_and_marker_dirs() {
        assert_eq!(resolve_path("/current").unwrap().kind, NodeKind::Alias);
        assert_eq!(resolve_path("/by-marker").unwrap().kind, NodeKind::Dir);
        assert_eq!(
            resolve_path("/by-marker/GBuffer/Floor").unwrap().kind,
            NodeKind::Dir
        );
        let m = resolve_path("/by-marker/GBuffer/Floor/42").unwrap();
        assert_eq!(m.kind, NodeKind::Leaf);
        assert_eq!(m.handler, Some("draw"));
    }

    #[test]
    fn rejection_cases() {
        for path in [
            "/nonexistent",
            "/draws/abc",
            "/resources/abc",
            "/textures/abc",
            "/textures/42/nonexistent",
            "/buffers/abc",
            "/draws/142/targets/colorX.png",
            "/textures/42/mips/abc.png",
            "/textures/42/mips/0",
            "/draws/142/targets/color0",
            "/draws/142/targets/depth",
            "/../etc/passwd",
            "/draws/../events",
        ] {
            assert!(resolve_path(path).is_none(), "{path}");
        }
    }

    #[test]
    fn empty_and_trailing_slash_normalization() {
        assert_eq!(resolve_path(""), resolve_path("/"));
        assert_eq!(resolve_path("/draws/142/"), resolve_path("/draws/142"));
        assert_eq!(resolve_path("/info/"), resolve_path("/info"));
    }

    #[test]
    fn resolved_paths_are_rooted() {
        // Anything that resolves must have come from a rooted path.
        assert!(resolve_path("draws/1").is_none());
        assert!(resolve_path("info").is_none());
    }
}
