//! Pass-dependency DAG from resource usage histories.

use std::collections::BTreeMap;

use core_model::PassInfo;
use core_replay::EventUsage;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
    pub src: String,
    pub dst: String,
    /// Resources that flow along this edge. Stable within a session,
    /// otherwise unordered.
    pub resources: Vec<u64>,
}

impl DepEdge {
    pub fn to_json(&self) -> Value {
        json!({"src": self.src, "dst": self.dst, "resources": self.resources})
    }
}

fn pass_index(passes: &[PassInfo], eid: u64) -> Option<usize> {
    passes
        .iter()
        .position(|p| p.begin_eid <= eid && eid <= p.end_eid)
}

/// Build the directed pass dependency edges.
///
/// Per resource (id 0 excluded), usages are scanned in event order; writer
/// passes accumulate, and each read inside a different pass emits one edge
/// per prior writer. Self-loops are suppressed and events outside any pass
/// window are ignored. Edges collapsing to the same (src, dst) merge their
/// resource lists.
pub fn build_pass_deps(
    passes: &[PassInfo],
    usage: &BTreeMap<u64, Vec<EventUsage>>,
) -> Vec<DepEdge> {
    let mut edges: Vec<DepEdge> = Vec::new();

    for (&resource, events) in usage {
        if resource == 0 {
            continue;
        }
        let mut writers: Vec<usize> = Vec::new();
        for eu in events {
            let Some(pass) = pass_index(passes, eu.eid) else {
                continue;
            };
            if eu.kind.is_write() {
                if !writers.contains(&pass) {
                    writers.push(pass);
                }
            } else if eu.kind.is_read() {
                for &writer in &writers {
                    if writer == pass {
                        continue;
                    }
                    let src = passes[writer].name.clone();
                    let dst = passes[pass].name.clone();
                    match edges.iter_mut().find(|e| e.src == src && e.dst == dst) {
                        Some(edge) => {
                            if !edge.resources.contains(&resource) {
                                edge.resources.push(resource);
                            }
                        }
                        None => edges.push(DepEdge {
                            src,
                            dst,
                            resources: vec![resource],
                        }),
                    }
                }
            }
        }
    }

    debug!(target: "deps", edges = edges.len(), "pass_deps_built");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_replay::UsageKind;

    fn pass(name: &str, begin: u64, end: u64) -> PassInfo {
        PassInfo {
            name: name.into(),
            original_name: name.into(),
            begin_eid: begin,
            end_eid: end,
            ..PassInfo::default()
        }
    }

    fn eu(eid: u64, kind: UsageKind) -> EventUsage {
        EventUsage { eid, kind }
    }

    fn usage_of(entries: Vec<(u64, Vec<EventUsage>)>) -> BTreeMap<u64, Vec<EventUsage>> {
        entries.into_iter().collect()
    }

    fn pairs(edges: &[DepEdge]) -> Vec<(&str, &str)> {
        edges
            .iter()
            .map(|e| (e.src.as_str(), e.dst.as_str()))
            .collect()
    }

    #[test]
    fn single_edge() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let usage = usage_of(vec![(
            97,
            vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
        )]);
        let edges = build_pass_deps(&passes, &usage);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].src, "A");
        assert_eq!(edges[0].dst, "B");
        assert_eq!(edges[0].resources, vec![97]);
    }

    #[test]
    fn independent_passes_have_no_edges() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let usage = usage_of(vec![
            (97, vec![eu(5, UsageKind::ColorTarget)]),
            (200, vec![eu(15, UsageKind::ColorTarget)]),
        ]);
        assert!(build_pass_deps(&passes, &usage).is_empty());
    }

    #[test]
    fn chain() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20), pass("C", 21, 30)];
        let usage = usage_of(vec![
            (
                97,
                vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
            ),
            (
                200,
                vec![eu(16, UsageKind::ColorTarget), eu(25, UsageKind::PsResource)],
            ),
        ]);
        let edges = build_pass_deps(&passes, &usage);
        let pairs = pairs(&edges);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("A", "B")));
        assert!(pairs.contains(&("B", "C")));
        assert!(!pairs.contains(&("A", "C")));
    }

    #[test]
    fn diamond() {
        let passes = vec![
            pass("A", 1, 10),
            pass("B", 11, 20),
            pass("C", 21, 30),
            pass("D", 31, 40),
        ];
        let usage = usage_of(vec![
            (
                97,
                vec![
                    eu(5, UsageKind::ColorTarget),
                    eu(15, UsageKind::PsResource),
                    eu(25, UsageKind::PsResource),
                ],
            ),
            (
                200,
                vec![eu(16, UsageKind::ColorTarget), eu(35, UsageKind::PsResource)],
            ),
            (
                300,
                vec![eu(26, UsageKind::ColorTarget), eu(36, UsageKind::PsResource)],
            ),
        ]);
        let edges = build_pass_deps(&passes, &usage);
        let got: std::collections::HashSet<(String, String)> = edges
            .iter()
            .map(|e| (e.src.clone(), e.dst.clone()))
            .collect();
        let want: std::collections::HashSet<(String, String)> = [
            ("A", "B"),
            ("A", "C"),
            ("B", "D"),
            ("C", "D"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn self_loop_suppressed() {
        let passes = vec![pass("A", 1, 10)];
        let usage = usage_of(vec![(
            97,
            vec![eu(3, UsageKind::Clear), eu(7, UsageKind::PsResource)],
        )]);
        assert!(build_pass_deps(&passes, &usage).is_empty());
    }

    #[test]
    fn events_outside_passes_are_ignored() {
        let passes = vec![pass("A", 1, 20), pass("B", 30, 40)];
        let usage = usage_of(vec![(
            97,
            vec![eu(50, UsageKind::ColorTarget), eu(55, UsageKind::PsResource)],
        )]);
        assert!(build_pass_deps(&passes, &usage).is_empty());
    }

    #[test]
    fn empty_inputs() {
        assert!(build_pass_deps(&[], &usage_of(vec![(97, vec![eu(5, UsageKind::ColorTarget)])]))
            .is_empty());
        assert!(build_pass_deps(&[pass("A", 1, 10)], &BTreeMap::new()).is_empty());
    }

    #[test]
    fn multiple_writers_each_reach_the_reader() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20), pass("C", 21, 30)];
        let usage = usage_of(vec![(
            97,
            vec![
                eu(5, UsageKind::ColorTarget),
                eu(15, UsageKind::ColorTarget),
                eu(25, UsageKind::PsResource),
            ],
        )]);
        let edges = build_pass_deps(&passes, &usage);
        let pairs = pairs(&edges);
        assert!(pairs.contains(&("A", "C")));
        assert!(pairs.contains(&("B", "C")));
    }

    #[test]
    fn shared_resources_merge_into_one_edge() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let usage = usage_of(vec![
            (
                97,
                vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
            ),
            (
                200,
                vec![eu(6, UsageKind::ColorTarget), eu(16, UsageKind::PsResource)],
            ),
        ]);
        let edges = build_pass_deps(&passes, &usage);
        assert_eq!(edges.len(), 1);
        let mut resources = edges[0].resources.clone();
        resources.sort_unstable();
        assert_eq!(resources, vec![97, 200]);
    }

    #[test]
    fn copy_src_reads_copy_dst_writes() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20), pass("C", 21, 30)];
        let usage = usage_of(vec![(
            97,
            vec![
                eu(5, UsageKind::CopySrc),
                eu(15, UsageKind::CopyDst),
                eu(25, UsageKind::PsResource),
            ],
        )]);
        let edges = build_pass_deps(&passes, &usage);
        let pairs = pairs(&edges);
        assert!(pairs.contains(&("B", "C")));
        assert!(!pairs.contains(&("A", "C")));
    }

    #[test]
    fn compute_rw_counts_as_write() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let usage = usage_of(vec![(
            97,
            vec![eu(5, UsageKind::CsRwResource), eu(15, UsageKind::CsResource)],
        )]);
        let edges = build_pass_deps(&passes, &usage);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].src, "A");
    }

    #[test]
    fn write_kinds_each_produce_an_edge() {
        for kind in [
            UsageKind::DepthStencilTarget,
            UsageKind::Clear,
            UsageKind::GenMips,
            UsageKind::ResolveDst,
        ] {
            let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
            let usage = usage_of(vec![(97, vec![eu(5, kind), eu(15, UsageKind::PsResource)])]);
            assert_eq!(build_pass_deps(&passes, &usage).len(), 1, "{kind:?}");
        }
    }

    #[test]
    fn read_kinds_produce_no_outgoing_edges() {
        for kind in [
            UsageKind::ResolveSrc,
            UsageKind::VertexBuffer,
            UsageKind::IndexBuffer,
        ] {
            let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
            let usage = usage_of(vec![(97, vec![eu(5, kind), eu(15, UsageKind::PsResource)])]);
            assert!(build_pass_deps(&passes, &usage).is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn null_resource_id_excluded() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let usage = usage_of(vec![(
            0,
            vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
        )]);
        assert!(build_pass_deps(&passes, &usage).is_empty());
    }

    #[test]
    fn duplicate_pass_names_still_form_edges() {
        // Two distinct windows carrying the same friendly name.
        let passes = vec![pass("MainPass", 1, 10), pass("MainPass", 11, 20)];
        let usage = usage_of(vec![(
            97,
            vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
        )]);
        let edges = build_pass_deps(&passes, &usage);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].src, "MainPass");
        assert_eq!(edges[0].dst, "MainPass");
    }

    #[test]
    fn large_resource_set_merges_into_one_edge() {
        let passes = vec![pass("A", 1, 10), pass("B", 11, 20)];
        let mut usage = BTreeMap::new();
        for rid in 1..=200u64 {
            usage.insert(
                rid,
                vec![eu(5, UsageKind::ColorTarget), eu(15, UsageKind::PsResource)],
            );
        }
        let edges = build_pass_deps(&passes, &usage);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].resources.len(), 200);
    }
}
