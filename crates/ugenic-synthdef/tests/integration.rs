//! Integration tests for ugenic-synthdef.
//!
//! Lowers registry-built graphs and reads the buffers back with a small
//! SCgf parser.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use ugenic_core::{ControlProxy, GE, Rate, SynthGraph, UGenGraph};
use ugenic_registry::ProductRegistry;
use ugenic_synthdef::{
    Destination, INLINE_LIMIT, LoadPlan, MAGIC, SynthDefError, lower, plan_load, save_defs,
};

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug)]
struct ParsedNode {
    name: String,
    rate: i8,
    inputs: Vec<(i32, i32)>,
    outputs: Vec<i8>,
    special: i16,
}

#[derive(Debug)]
struct ParsedDef {
    name: String,
    constants: Vec<f32>,
    params: Vec<f32>,
    param_names: Vec<(String, i32)>,
    nodes: Vec<ParsedNode>,
}

fn pstring(r: &mut Cursor<&[u8]>) -> String {
    let len = r.read_u8().unwrap() as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

fn count(r: &mut Cursor<&[u8]>) -> usize {
    r.read_i32::<BigEndian>().unwrap() as usize
}

fn parse(bytes: &[u8]) -> Vec<ParsedDef> {
    let mut r = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).unwrap();
    assert_eq!(&magic, MAGIC);
    assert_eq!(r.read_i32::<BigEndian>().unwrap(), 2);
    let defs = r.read_i16::<BigEndian>().unwrap();

    let mut parsed = Vec::new();
    for _ in 0..defs {
        let name = pstring(&mut r);
        let n = count(&mut r);
        let constants = (0..n).map(|_| r.read_f32::<BigEndian>().unwrap()).collect();
        let n = count(&mut r);
        let params = (0..n).map(|_| r.read_f32::<BigEndian>().unwrap()).collect();
        let n = count(&mut r);
        let param_names = (0..n)
            .map(|_| {
                let name = pstring(&mut r);
                (name, r.read_i32::<BigEndian>().unwrap())
            })
            .collect();
        let n = count(&mut r);
        let mut nodes = Vec::with_capacity(n);
        for _ in 0..n {
            let name = pstring(&mut r);
            let rate = r.read_i8().unwrap();
            let num_inputs = count(&mut r);
            let num_outputs = count(&mut r);
            let special = r.read_i16::<BigEndian>().unwrap();
            let inputs = (0..num_inputs)
                .map(|_| {
                    (
                        r.read_i32::<BigEndian>().unwrap(),
                        r.read_i32::<BigEndian>().unwrap(),
                    )
                })
                .collect();
            let outputs = (0..num_outputs).map(|_| r.read_i8().unwrap()).collect();
            nodes.push(ParsedNode {
                name,
                rate,
                inputs,
                outputs,
                special,
            });
        }
        assert_eq!(r.read_i16::<BigEndian>().unwrap(), 0, "variants");
        parsed.push(ParsedDef {
            name,
            constants,
            params,
            param_names,
            nodes,
        });
    }
    assert_eq!(r.position() as usize, bytes.len(), "trailing bytes");
    parsed
}

fn create(registry: &ProductRegistry, key: &str, rate: Rate, args: Vec<GE>) -> GE {
    registry
        .create(key, Some(rate), args)
        .unwrap_or_else(|e| panic!("{key}: {e}"))
}

fn stereo_patch(registry: &ProductRegistry) -> UGenGraph {
    let freq = ControlProxy::make("freq", Rate::Control, vec![330.0]).unwrap();
    let amp = ControlProxy::make("amp", Rate::Control, vec![0.2]).unwrap();
    let detune = GE::seq([GE::from(1.0), GE::from(1.005)]);
    let osc = create(registry, "Saw", Rate::Audio, vec![freq.clone() * detune]);
    let lfo = create(registry, "SinOsc", Rate::Control, vec![GE::from(0.5)]);
    // control-rate signal into a matched audio input gets an adapter
    let smooth = create(registry, "LPF", Rate::Audio, vec![lfo, GE::from(10.0)]);
    let filtered = create(registry, "LPF", Rate::Audio, vec![osc * smooth, GE::from(1200.0)]);
    let out = create(
        registry,
        "Out",
        Rate::Audio,
        vec![GE::from(0.0), filtered * amp.clone()],
    );
    SynthGraph::new(vec![freq, amp, out]).expand().unwrap()
}

// ============================================================================
// Lowering
// ============================================================================

#[test]
fn lowered_graph_reads_back_node_for_node() {
    let registry = ProductRegistry::standard();
    let graph = stereo_patch(&registry);
    let def = lower("stereo", &graph).unwrap();
    let parsed = parse(def.bytes());
    assert_eq!(parsed.len(), 1);
    let parsed = &parsed[0];

    assert_eq!(parsed.name, "stereo");
    assert_eq!(parsed.params, vec![330.0, 0.2]);
    assert_eq!(
        parsed.param_names,
        vec![("freq".to_owned(), 0), ("amp".to_owned(), 1)]
    );
    assert_eq!(parsed.nodes.len(), graph.len());

    for (node, ugen) in parsed.nodes.iter().zip(graph.ugens()) {
        assert_eq!(node.name, ugen.name());
        assert_eq!(node.rate, ugen.rate().id() as i8);
        assert_eq!(node.special, ugen.special_index());
        assert_eq!(node.inputs.len(), ugen.inputs().len());
        assert_eq!(node.outputs.len(), ugen.num_outputs());
        for (input, expected) in node.inputs.iter().zip(ugen.inputs()) {
            match expected.as_constant() {
                Some(c) => {
                    assert_eq!(input.0, -1);
                    assert_eq!(parsed.constants[input.1 as usize], c.value());
                }
                None => assert!(input.0 >= 0),
            }
        }
    }
}

#[test]
fn adapters_and_controls_appear_as_ordinary_nodes() {
    let registry = ProductRegistry::standard();
    let graph = stereo_patch(&registry);
    let parsed = &parse(lower("stereo", &graph).unwrap().bytes())[0];
    let names: Vec<&str> = parsed.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names.iter().filter(|&&n| n == "Control").count(), 2);
    assert!(names.contains(&"K2A"));
    assert_eq!(names.last(), Some(&"Out"));

    let amp_control = &parsed.nodes[1];
    assert_eq!(amp_control.special, 1);
    assert_eq!(amp_control.outputs, vec![Rate::Control.id() as i8]);
}

#[test]
fn inputs_only_reference_earlier_nodes() {
    let registry = ProductRegistry::standard();
    let parsed = &parse(lower("stereo", &stereo_patch(&registry)).unwrap().bytes())[0];
    for (i, node) in parsed.nodes.iter().enumerate() {
        for &(src, out) in &node.inputs {
            if src >= 0 {
                assert!((src as usize) < i, "node {i} reads node {src}");
                assert!((out as usize) < parsed.nodes[src as usize].outputs.len());
            }
        }
    }
}

#[test]
fn lowering_is_deterministic() {
    let registry = ProductRegistry::standard();
    let a = lower("det", &stereo_patch(&registry)).unwrap();
    let b = lower("det", &stereo_patch(&registry)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn oversized_definition_name_fails() {
    let graph = SynthGraph::new(vec![]).expand().unwrap();
    let err = lower(&"n".repeat(300), &graph).unwrap_err();
    assert!(matches!(err, SynthDefError::NameTooLong(_)));
}

// ============================================================================
// Load planning
// ============================================================================

#[test]
fn wide_graph_is_large() {
    let registry = ProductRegistry::standard();
    let freqs = GE::seq((0..600).map(|i| GE::from(100.0 + i as f32)));
    let osc = create(&registry, "SinOsc", Rate::Audio, vec![freqs]);
    let graph = SynthGraph::new(vec![osc]).expand().unwrap();
    let def = lower("wide", &graph).unwrap();

    assert!(def.byte_len() > INLINE_LIMIT);
    assert_eq!(def.load_plan(Destination::Local), LoadPlan::OutOfBand);
    assert_eq!(
        def.load_plan(Destination::Remote),
        LoadPlan::InlineWithWarning
    );
}

#[test]
fn small_graph_is_inline_everywhere() {
    let registry = ProductRegistry::standard();
    let def = lower("stereo", &stereo_patch(&registry)).unwrap();
    assert!(def.byte_len() <= INLINE_LIMIT);
    assert_eq!(def.load_plan(Destination::Remote), LoadPlan::Inline);
}

#[test]
fn chunking_boundary() {
    assert_eq!(plan_load(INLINE_LIMIT, Destination::Local), LoadPlan::Inline);
    assert_eq!(
        plan_load(INLINE_LIMIT + 1, Destination::Local),
        LoadPlan::OutOfBand
    );
    assert_eq!(
        plan_load(INLINE_LIMIT + 1, Destination::Remote),
        LoadPlan::InlineWithWarning
    );
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn save_defs_writes_a_multi_definition_file() {
    let registry = ProductRegistry::standard();
    let stereo = stereo_patch(&registry);
    let noise = SynthGraph::new(vec![create(&registry, "WhiteNoise", Rate::Audio, vec![])])
        .expand()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patches.scsyndef");
    save_defs(&path, &[("stereo", &stereo), ("noise", &noise)]).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let parsed = parse(&bytes);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].name, "stereo");
    assert_eq!(parsed[1].name, "noise");
    assert_eq!(parsed[1].nodes.len(), 1);
    assert!(parsed[1].constants.is_empty());
}

#[test]
fn save_defs_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("x.scsyndef");
    let err = save_defs(&path, &[]).unwrap_err();
    assert!(matches!(err, SynthDefError::WriteFile { .. }));
    assert!(err.to_string().contains("x.scsyndef"));
}
