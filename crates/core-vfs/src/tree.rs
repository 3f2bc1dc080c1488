//! Static skeleton + bounded dynamic subtrees.
//!
//! The static dictionary is the single source of truth for reachability: a
//! path is listable iff its node is present. Per-draw shader subtrees are
//! populated on demand and bounded by an LRU; evicting an entry removes
//! every static path it inserted, in the same operation, so the dictionary
//! never references an evicted subtree.

use ahash::AHashMap;
use lru::LruCache;
use tracing::debug;

use core_model::{build_pass_list, flatten_actions, PassInfo};
use core_replay::{Action, PipeSnapshot, ResourceDesc, Stage};

use crate::router::NodeKind;

pub const SHADER_LEAVES: [&str; 4] = ["disasm", "source", "reflect", "constants"];

#[derive(Debug, Clone)]
pub struct VfsNode {
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<String>,
}

impl VfsNode {
    fn dir(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: NodeKind::Dir,
            children: Vec::new(),
        }
    }

    fn leaf(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: NodeKind::Leaf,
            children: Vec::new(),
        }
    }

    fn leaf_bin(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: NodeKind::LeafBin,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct VfsTree {
    pub static_map: AHashMap<String, VfsNode>,
    /// Size of the dictionary right after the skeleton build; the LRU
    /// invariant is checked against this.
    skeleton_len: usize,
    /// eid → static paths inserted for its shader subtree.
    subtrees: LruCache<u64, Vec<String>>,
    pub pass_list: Vec<PassInfo>,
    /// Friendly → original pass name.
    pub pass_name_map: AHashMap<String, String>,
}

impl VfsTree {
    pub fn new(capacity: usize) -> Self {
        Self {
            static_map: AHashMap::new(),
            skeleton_len: 0,
            subtrees: LruCache::new(capacity.max(1)),
            pass_list: Vec::new(),
            pass_name_map: AHashMap::new(),
        }
    }

    pub fn node(&self, path: &str) -> Option<&VfsNode> {
        self.static_map.get(path)
    }

    pub fn skeleton_len(&self) -> usize {
        self.skeleton_len
    }

    pub fn static_len(&self) -> usize {
        self.static_map.len()
    }

    pub fn subtree_count(&self) -> usize {
        self.subtrees.len()
    }

    /// Cached shader subtree for a draw; promotes the entry.
    pub fn get_draw_subtree(&mut self, eid: u64) -> Option<&Vec<String>> {
        self.subtrees.get(&eid)
    }

    /// Install a draw's subtree path list, evicting (and cleaning up) the
    /// least recently used entry when at capacity.
    pub fn set_draw_subtree(&mut self, eid: u64, paths: Vec<String>) {
        if self.subtrees.len() == self.subtrees.cap() && !self.subtrees.contains(&eid) {
            let victim = self.subtrees.peek_lru().map(|(&k, _)| k);
            if let Some(victim) = victim {
                if let Some(victim_paths) = self.subtrees.pop(&victim) {
                    self.remove_subtree_paths(victim, &victim_paths);
                }
            }
        }
        self.subtrees.put(eid, paths);
    }

    fn remove_subtree_paths(&mut self, eid: u64, paths: &[String]) {
        for path in paths {
            self.static_map.remove(path);
        }
        if let Some(node) = self.static_map.get_mut(&format!("/draws/{eid}/shader")) {
            node.children.clear();
        }
        debug!(target: "vfs", eid, removed = paths.len(), "shader_subtree_evicted");
    }

    fn insert(&mut self, path: &str, node: VfsNode) {
        self.static_map.insert(path.to_owned(), node);
    }

    fn seal_skeleton(&mut self) {
        self.skeleton_len = self.static_map.len();
    }
}

fn marker_groups(actions: &[Action], passes: &[PassInfo]) -> Vec<(String, Vec<u64>)> {
    let mut groups: Vec<(String, Vec<u64>)> = Vec::new();
    for a in flatten_actions(actions, passes) {
        if !a.kind().is_draw() || a.parent_marker == "-" {
            continue;
        }
        match groups.iter_mut().find(|(m, _)| *m == a.parent_marker) {
            Some((_, eids)) => eids.push(a.eid),
            None => groups.push((a.parent_marker.clone(), vec![a.eid])),
        }
    }
    groups
}

/// Build the static skeleton from the action tree and resource tables.
pub fn build_vfs_skeleton(
    actions: &[Action],
    resources: &[ResourceDesc],
    textures: &[u64],
    buffers: &[u64],
    capacity: usize,
) -> VfsTree {
    let mut tree = VfsTree::new(capacity);
    let passes = build_pass_list(actions);
    let flat = flatten_actions(actions, &passes);

    let mut root = VfsNode::dir("/");
    root.children = vec![
        "capabilities".into(),
        "info".into(),
        "stats".into(),
        "log".into(),
        "events".into(),
        "draws".into(),
        "by-marker".into(),
        "passes".into(),
        "resources".into(),
        "textures".into(),
        "buffers".into(),
        "shaders".into(),
        "counters".into(),
        "current".into(),
    ];
    tree.insert("/", root);
    for name in ["capabilities", "info", "stats", "log"] {
        tree.insert(&format!("/{name}"), VfsNode::leaf(name));
    }

    // /events — every flattened event id.
    let mut events = VfsNode::dir("events");
    for a in &flat {
        events.children.push(a.eid.to_string());
        tree.insert(&format!("/events/{}", a.eid), VfsNode::leaf(&a.eid.to_string()));
    }
    tree.insert("/events", events);

    // /draws — draw and dispatch events with their fixed sub-structure.
    let mut draws = VfsNode::dir("draws");
    for a in flat.iter().filter(|a| core_model::is_work(a.flags)) {
        let eid = a.eid;
        draws.children.push(eid.to_string());
        let base = format!("/draws/{eid}");
        let mut node = VfsNode::dir(&eid.to_string());
        node.children = vec!["pipeline".into(), "shader".into(), "bindings".into()];
        tree.insert(&base, node);

        let mut pipeline = VfsNode::dir("pipeline");
        pipeline.children = vec!["summary".into()];
        tree.insert(&format!("{base}/pipeline"), pipeline);
        tree.insert(&format!("{base}/pipeline/summary"), VfsNode::leaf("summary"));

        tree.insert(&format!("{base}/shader"), VfsNode::dir("shader"));
        tree.insert(&format!("{base}/bindings"), VfsNode::dir("bindings"));
    }
    tree.insert("/draws", draws);

    // /by-marker — marker paths nest by segment, draws at the leaves.
    let mut by_marker = VfsNode::dir("by-marker");
    for (marker, eids) in marker_groups(actions, &passes) {
        let mut base = "/by-marker".to_owned();
        for segment in marker.split('/').filter(|s| !s.is_empty()) {
            let parent = base.clone();
            base.push('/');
            base.push_str(segment);
            if tree.static_map.get(&base).is_none() {
                tree.insert(&base, VfsNode::dir(segment));
                if parent == "/by-marker" {
                    by_marker.children.push(segment.to_owned());
                } else if let Some(node) = tree.static_map.get_mut(&parent) {
                    if !node.children.iter().any(|c| c == segment) {
                        node.children.push(segment.to_owned());
                    }
                }
            }
        }
        for eid in eids {
            let name = eid.to_string();
            tree.insert(&format!("{base}/{name}"), VfsNode::leaf(&name));
            if let Some(node) = tree.static_map.get_mut(&base) {
                node.children.push(name);
            }
        }
    }
    tree.insert("/by-marker", by_marker);

    // /passes — friendly names with per-pass info/draws/attachments.
    let mut passes_node = VfsNode::dir("passes");
    for pass in &passes {
        passes_node.children.push(pass.name.clone());
        let base = format!("/passes/{}", pass.name);
        let mut node = VfsNode::dir(&pass.name);
        node.children = vec!["info".into(), "draws".into(), "attachments".into()];
        tree.insert(&base, node);
        tree.insert(&format!("{base}/info"), VfsNode::leaf("info"));

        let mut draws_dir = VfsNode::dir("draws");
        for eid in &pass.draw_eids {
            let name = eid.to_string();
            draws_dir.children.push(name.clone());
            tree.insert(&format!("{base}/draws/{name}"), VfsNode::leaf(&name));
        }
        tree.insert(&format!("{base}/draws"), draws_dir);
        tree.insert(&format!("{base}/attachments"), VfsNode::dir("attachments"));

        tree.pass_name_map
            .insert(pass.name.clone(), pass.original_name.clone());
    }
    tree.insert("/passes", passes_node);

    // /resources, /textures, /buffers — id dirs from the open-time tables.
    let mut resources_node = VfsNode::dir("resources");
    for r in resources {
        let name = r.id.to_string();
        resources_node.children.push(name.clone());
        let mut node = VfsNode::dir(&name);
        node.children = vec!["info".into()];
        tree.insert(&format!("/resources/{name}"), node);
        tree.insert(&format!("/resources/{name}/info"), VfsNode::leaf("info"));
    }
    tree.insert("/resources", resources_node);

    let mut textures_node = VfsNode::dir("textures");
    for &id in textures {
        let name = id.to_string();
        textures_node.children.push(name.clone());
        let mut node = VfsNode::dir(&name);
        node.children = vec![
            "info".into(),
            "image.png".into(),
            "mips".into(),
            "data".into(),
        ];
        tree.insert(&format!("/textures/{name}"), node);
        tree.insert(&format!("/textures/{name}/info"), VfsNode::leaf("info"));
        tree.insert(
            &format!("/textures/{name}/image.png"),
            VfsNode::leaf_bin("image.png"),
        );
        tree.insert(&format!("/textures/{name}/mips"), VfsNode::dir("mips"));
        tree.insert(&format!("/textures/{name}/data"), VfsNode::leaf_bin("data"));
    }
    tree.insert("/textures", textures_node);

    let mut buffers_node = VfsNode::dir("buffers");
    for &id in buffers {
        let name = id.to_string();
        buffers_node.children.push(name.clone());
        let mut node = VfsNode::dir(&name);
        node.children = vec!["info".into(), "data".into()];
        tree.insert(&format!("/buffers/{name}"), node);
        tree.insert(&format!("/buffers/{name}/info"), VfsNode::leaf("info"));
        tree.insert(&format!("/buffers/{name}/data"), VfsNode::leaf_bin("data"));
    }
    tree.insert("/buffers", buffers_node);

    tree.insert("/shaders", VfsNode::dir("shaders"));

    let mut counters = VfsNode::dir("counters");
    counters.children = vec!["list".into()];
    tree.insert("/counters", counters);
    tree.insert("/counters/list", VfsNode::leaf("list"));

    tree.insert(
        "/current",
        VfsNode {
            name: "current".into(),
            kind: NodeKind::Alias,
            children: Vec::new(),
        },
    );

    tree.pass_list = passes;
    tree.seal_skeleton();
    tree
}

/// Populate `/draws/<eid>/shader` from the pipeline snapshot at that draw.
/// Returns the static paths owned by the subtree entry. Cached: a repeat
/// call only promotes the LRU entry.
pub fn populate_draw_subtree(tree: &mut VfsTree, eid: u64, snap: &PipeSnapshot) -> Vec<String> {
    if let Some(paths) = tree.get_draw_subtree(eid) {
        return paths.clone();
    }

    let base = format!("/draws/{eid}/shader");
    let mut inserted: Vec<String> = Vec::new();
    let mut stage_names: Vec<String> = Vec::new();

    for stage in Stage::ALL {
        if snap.stage(stage).shader == 0 {
            continue;
        }
        stage_names.push(stage.name().to_owned());
        let stage_base = format!("{base}/{}", stage.name());
        let mut node = VfsNode::dir(stage.name());
        node.children = SHADER_LEAVES.iter().map(|s| s.to_string()).collect();
        tree.insert(&stage_base, node);
        inserted.push(stage_base.clone());
        for leaf in SHADER_LEAVES {
            let path = format!("{stage_base}/{leaf}");
            tree.insert(&path, VfsNode::leaf(leaf));
            inserted.push(path);
        }
    }

    if let Some(node) = tree.static_map.get_mut(&base) {
        node.children = stage_names;
    }
    tree.set_draw_subtree(eid, inserted.clone());
    inserted
}

/// Populate `/shaders/<sid>/{info,disasm}` after the shader cache build.
/// Permanent entries — not part of the LRU-bounded namespace.
pub fn populate_shaders_subtree(tree: &mut VfsTree, shader_ids: &[u64]) {
    let mut ids: Vec<u64> = shader_ids.to_vec();
    ids.sort_unstable();
    let mut children: Vec<String> = Vec::new();
    for sid in ids {
        let name = sid.to_string();
        children.push(name.clone());
        let base = format!("/shaders/{name}");
        let mut node = VfsNode::dir(&name);
        node.children = vec!["info".into(), "disasm".into()];
        tree.insert(&base, node);
        tree.insert(&format!("{base}/info"), VfsNode::leaf("info"));
        tree.insert(&format!("{base}/disasm"), VfsNode::leaf("disasm"));
    }
    if let Some(node) = tree.static_map.get_mut("/shaders") {
        node.children = children;
    }
    // Permanent additions move the skeleton baseline.
    tree.skeleton_len = tree.static_map.len()
        - tree
            .subtrees
            .iter()
            .map(|(_, paths)| paths.len())
            .sum::<usize>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_replay::ActionFlags;

    fn actions() -> Vec<Action> {
        vec![
            Action {
                eid: 1,
                flags: ActionFlags::BEGIN_PASS,
                name: "ShadowPass".into(),
                children: vec![
                    Action {
                        eid: 10,
                        flags: ActionFlags::DRAWCALL,
                        num_indices: 300,
                        ..Action::default()
                    },
                    Action {
                        eid: 20,
                        flags: ActionFlags::DRAWCALL | ActionFlags::INDEXED,
                        num_indices: 600,
                        ..Action::default()
                    },
                ],
                ..Action::default()
            },
            Action {
                eid: 2,
                flags: ActionFlags::END_PASS,
                name: "End ShadowPass".into(),
                ..Action::default()
            },
            Action {
                eid: 3,
                flags: ActionFlags::BEGIN_PASS,
                name: "GBuffer".into(),
                children: vec![Action {
                    eid: 30,
                    flags: ActionFlags::DRAWCALL,
                    num_indices: 900,
                    ..Action::default()
                }],
                ..Action::default()
            },
            Action {
                eid: 4,
                flags: ActionFlags::END_PASS,
                name: "End GBuffer".into(),
                ..Action::default()
            },
            Action {
                eid: 50,
                flags: ActionFlags::DISPATCH,
                name: "Dispatch #50".into(),
                ..Action::default()
            },
        ]
    }

    fn resources() -> Vec<ResourceDesc> {
        vec![
            ResourceDesc {
                id: 5,
                ty: "Texture2D".into(),
                name: "Albedo".into(),
            },
            ResourceDesc {
                id: 10,
                ty: "Texture2D".into(),
                name: "DepthBuffer".into(),
            },
        ]
    }

    fn skeleton() -> VfsTree {
        build_vfs_skeleton(&actions(), &resources(), &[5, 10], &[], 16)
    }

    fn snap_vs_ps() -> PipeSnapshot {
        let mut snap = PipeSnapshot::default();
        snap.stage_mut(Stage::Vs).shader = 100;
        snap.stage_mut(Stage::Ps).shader = 200;
        snap
    }

    #[test]
    fn root_children_order() {
        let tree = skeleton();
        let root = tree.node("/").unwrap();
        assert_eq!(root.kind, NodeKind::Dir);
        assert_eq!(
            root.children,
            vec![
                "capabilities",
                "info",
                "stats",
                "log",
                "events",
                "draws",
                "by-marker",
                "passes",
                "resources",
                "textures",
                "buffers",
                "shaders",
                "counters",
                "current",
            ]
        );
        for name in ["capabilities", "info", "stats", "log"] {
            assert_eq!(tree.node(&format!("/{name}")).unwrap().kind, NodeKind::Leaf);
        }
    }

    #[test]
    fn draws_and_events_children() {
        let tree = skeleton();
        let draws = tree.node("/draws").unwrap();
        for eid in ["10", "20", "30", "50"] {
            assert!(draws.children.iter().any(|c| c == eid), "{eid}");
        }
        let events = tree.node("/events").unwrap();
        for eid in ["1", "2", "3", "4", "10", "20", "30", "50"] {
            assert!(events.children.iter().any(|c| c == eid), "{eid}");
            assert_eq!(tree.node(&format!("/events/{eid}")).unwrap().kind, NodeKind::Leaf);
        }
    }

    #[test]
    fn draw_node_structure() {
        let tree = skeleton();
        let node = tree.node("/draws/10").unwrap();
        assert_eq!(node.children, vec!["pipeline", "shader", "bindings"]);
        let pipe = tree.node("/draws/10/pipeline").unwrap();
        assert_eq!(pipe.children, vec!["summary"]);
        assert_eq!(
            tree.node("/draws/10/pipeline/summary").unwrap().kind,
            NodeKind::Leaf
        );
        assert!(tree.node("/draws/10/shader").unwrap().children.is_empty());
    }

    #[test]
    fn pass_structure() {
        let tree = skeleton();
        let passes = tree.node("/passes").unwrap();
        assert!(passes.children.iter().any(|c| c == "ShadowPass"));
        assert!(passes.children.iter().any(|c| c == "GBuffer"));
        let shadow = tree.node("/passes/ShadowPass").unwrap();
        assert_eq!(shadow.children, vec!["info", "draws", "attachments"]);
        assert_eq!(tree.node("/passes/ShadowPass/info").unwrap().kind, NodeKind::Leaf);
        let draws = tree.node("/passes/ShadowPass/draws").unwrap();
        assert_eq!(draws.kind, NodeKind::Dir);
        assert_eq!(draws.children, vec!["10", "20"]);
        assert_eq!(
            tree.node("/passes/ShadowPass/draws/10").unwrap().kind,
            NodeKind::Leaf
        );
    }

    #[test]
    fn resource_and_texture_nodes() {
        let tree = skeleton();
        let res = tree.node("/resources").unwrap();
        assert!(res.children.iter().any(|c| c == "5"));
        assert_eq!(tree.node("/resources/5").unwrap().children, vec!["info"]);
        let tex = tree.node("/textures/5").unwrap();
        assert_eq!(tex.children, vec!["info", "image.png", "mips", "data"]);
        assert_eq!(
            tree.node("/textures/5/image.png").unwrap().kind,
            NodeKind::LeafBin
        );
    }

    #[test]
    fn current_is_alias_and_shaders_empty() {
        let tree = skeleton();
        assert_eq!(tree.node("/current").unwrap().kind, NodeKind::Alias);
        assert!(tree.node("/shaders").unwrap().children.is_empty());
    }

    #[test]
    fn populate_discovers_bound_stages() {
        let mut tree = skeleton();
        let inserted = populate_draw_subtree(&mut tree, 10, &snap_vs_ps());
        let shader = tree.node("/draws/10/shader").unwrap();
        assert_eq!(shader.children, vec!["vs", "ps"]);
        let ps = tree.node("/draws/10/shader/ps").unwrap();
        assert_eq!(ps.kind, NodeKind::Dir);
        assert_eq!(ps.children, vec!["disasm", "source", "reflect", "constants"]);
        assert_eq!(tree.node("/draws/10/shader/ps/disasm").unwrap().kind, NodeKind::Leaf);
        assert!(inserted.contains(&"/draws/10/shader/vs".to_owned()));
        assert!(inserted.contains(&"/draws/10/shader/ps/constants".to_owned()));
    }

    #[test]
    fn populate_is_cached() {
        let mut tree = skeleton();
        let first = populate_draw_subtree(&mut tree, 10, &snap_vs_ps());
        let len_after_first = tree.static_len();
        let second = populate_draw_subtree(&mut tree, 10, &snap_vs_ps());
        assert_eq!(first, second);
        assert_eq!(tree.static_len(), len_after_first);
    }

    #[test]
    fn populate_with_no_bound_stages() {
        let mut tree = skeleton();
        let inserted = populate_draw_subtree(&mut tree, 20, &PipeSnapshot::default());
        assert!(inserted.is_empty());
        assert!(tree.node("/draws/20/shader").unwrap().children.is_empty());
        // The empty subtree is still a cache entry.
        assert!(tree.get_draw_subtree(20).is_some());
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut tree = VfsTree::new(2);
        tree.set_draw_subtree(10, vec!["/a".into()]);
        tree.set_draw_subtree(20, vec!["/b".into()]);
        tree.set_draw_subtree(30, vec!["/c".into()]);
        assert!(tree.get_draw_subtree(10).is_none());
        assert!(tree.get_draw_subtree(20).is_some());
        assert!(tree.get_draw_subtree(30).is_some());
    }

    #[test]
    fn access_promotes_entry() {
        let mut tree = VfsTree::new(2);
        tree.set_draw_subtree(10, vec!["/a".into()]);
        tree.set_draw_subtree(20, vec!["/b".into()]);
        tree.get_draw_subtree(10);
        tree.set_draw_subtree(30, vec!["/c".into()]);
        assert!(tree.get_draw_subtree(10).is_some());
        assert!(tree.get_draw_subtree(20).is_none());
        assert!(tree.get_draw_subtree(30).is_some());
    }

    #[test]
    fn capacity_respected() {
        let mut tree = VfsTree::new(3);
        for eid in 0..10u64 {
            tree.set_draw_subtree(eid, vec![format!("/{eid}")]);
        }
        assert_eq!(tree.subtree_count(), 3);
    }

    #[test]
    fn eviction_cleans_static_nodes() {
        let mut tree = build_vfs_skeleton(&actions(), &resources(), &[], &[], 1);
        populate_draw_subtree(&mut tree, 10, &snap_vs_ps());
        assert!(tree.node("/draws/10/shader/ps").is_some());
        assert!(tree.node("/draws/10/shader/ps/disasm").is_some());

        populate_draw_subtree(&mut tree, 20, &snap_vs_ps());
        assert!(tree.get_draw_subtree(10).is_none());
        assert!(tree.node("/draws/10/shader/ps").is_none());
        assert!(tree.node("/draws/10/shader/ps/disasm").is_none());
        assert!(tree.node("/draws/10/shader").unwrap().children.is_empty());
        assert!(tree.node("/draws/20/shader/ps").is_some());
    }

    #[test]
    fn static_len_tracks_skeleton_plus_reachable_subtrees() {
        let mut tree = build_vfs_skeleton(&actions(), &resources(), &[], &[], 2);
        let skeleton_len = tree.skeleton_len();
        assert_eq!(tree.static_len(), skeleton_len);

        for eid in [10u64, 20, 30] {
            populate_draw_subtree(&mut tree, eid, &snap_vs_ps());
        }
        // Capacity 2: the reachable subtrees are exactly the LRU contents.
        let reachable: usize = [10u64, 20, 30]
            .iter()
            .filter_map(|eid| tree.subtrees.peek(eid).map(Vec::len))
            .sum();
        assert_eq!(tree.subtree_count(), 2);
        assert_eq!(tree.static_len(), skeleton_len + reachable);
    }

    #[test]
    fn by_marker_tree_nests_segments() {
        let actions = vec![Action {
            eid: 41,
            name: "Shadow/Terrain".into(),
            children: vec![Action {
                eid: 42,
                flags: ActionFlags::DRAWCALL,
                num_indices: 3,
                ..Action::default()
            }],
            ..Action::default()
        }];
        let tree = build_vfs_skeleton(&actions, &[], &[], &[], 16);
        assert!(tree.node("/by-marker").unwrap().children.iter().any(|c| c == "Shadow"));
        assert_eq!(
            tree.node("/by-marker/Shadow").unwrap().children,
            vec!["Terrain"]
        );
        assert_eq!(
            tree.node("/by-marker/Shadow/Terrain").unwrap().children,
            vec!["42"]
        );
        assert_eq!(
            tree.node("/by-marker/Shadow/Terrain/42").unwrap().kind,
            NodeKind::Leaf
        );
    }

    #[test]
    fn every_static_path_is_listed_by_its_parent() {
        let mut tree = skeleton();
        populate_draw_subtree(&mut tree, 10, &snap_vs_ps());
        for path in tree.static_map.keys() {
            if path == "/" {
                continue;
            }
            let (parent, name) = path.rsplit_once('/').unwrap();
            let parent = if parent.is_empty() { "/" } else { parent };
            let node = tree
                .static_map
                .get(parent)
                .unwrap_or_else(|| panic!("{path} has no parent node"));
            assert!(
                node.children.iter().any(|c| c == name),
                "{path} not listed under {parent}"
            );
        }
    }

    mod lru_invariants {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// After N insertions into a capacity-C cache, exactly
            /// min(N, C) subtrees stay reachable.
            #[test]
            fn bounded_reachability(count in 1usize..40, cap in 1usize..8) {
                let mut tree = VfsTree::new(cap);
                for eid in 0..count {
                    tree.set_draw_subtree(eid as u64, vec![format!("/x/{eid}")]);
                }
                prop_assert_eq!(tree.subtree_count(), count.min(cap));
            }
        }
    }

    #[test]
    fn shaders_subtree_population() {
        let mut tree = skeleton();
        populate_shaders_subtree(&mut tree, &[200, 100]);
        assert_eq!(tree.node("/shaders").unwrap().children, vec!["100", "200"]);
        assert_eq!(tree.node("/shaders/100").unwrap().children, vec!["info", "disasm"]);
        assert_eq!(tree.node("/shaders/100/disasm").unwrap().kind, NodeKind::Leaf);
    }
}
