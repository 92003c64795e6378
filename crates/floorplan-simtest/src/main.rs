//! Floor-plan Headless Layout Harness
//!
//! Runs plans through the layout pipeline and the envelope builder, checks
//! the geometric invariants of the result, and prints a pass/fail summary.
//! Runs entirely in-process, with no rendering.
//!
//! Usage:
//!   cargo run -p floorplan-simtest
//!   cargo run -p floorplan-simtest -- --plan my_plan.json --layout-out layout.json --verbose
//!   cargo run -p floorplan-simtest -- --check-layout layout.json

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;

use floorplan_logic::config::{
    validate_config, validate_envelope_config, EnvelopeConfig, LayoutConfig,
};
use floorplan_logic::envelope::{build_envelope, cells_from_layout, merge_walls, offset_outer_walls};
use floorplan_logic::geometry::Rect;
use floorplan_logic::input::parse_plan;
use floorplan_logic::model::{WallKind, WallSegment};
use floorplan_logic::pipeline::{generate_layout, Layout, LayoutRun};
use floorplan_logic::validate::{validate_layout_record, Severity};

// ── Sample plans (same JSON the integration tests use) ──────────────────
const SAMPLE_PLANS: &str = include_str!("../../../data/sample_plans.json");

/// Headless layout harness
#[derive(Parser, Debug)]
#[command(name = "floorplan-simtest")]
#[command(about = "Run plans through the layout pipeline and check the results")]
struct Args {
    /// Plan JSON file (single plan or a `plans` document); bundled samples when absent
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Run only this plan of a multi-plan document
    #[arg(long)]
    plan_id: Option<String>,

    /// Layout configuration JSON; defaults when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the generated layout(s) here
    #[arg(long)]
    layout_out: Option<PathBuf>,

    /// Write the wall segments here
    #[arg(long)]
    walls_out: Option<PathBuf>,

    /// Offset outer walls outward by half the wall thickness
    #[arg(long)]
    offset_walls: bool,

    /// Only check an existing layout JSON file (as written by --layout-out)
    #[arg(long, conflicts_with_all = ["plan", "plan_id"])]
    check_layout: Option<PathBuf>,

    /// Show every check and debug logs
    #[arg(long, short = 'v')]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Everything one plan produced, for the output files.
struct PlanOutput {
    label: String,
    layout: Layout,
    walls: Vec<WallSegment>,
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    println!("=== Floor-plan Layout Harness ===\n");

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config: {}", e);
            std::process::exit(2);
        }
    };
    let envelope = EnvelopeConfig {
        offset_outer: args.offset_walls,
        ..EnvelopeConfig::default()
    };

    let document = match &args.plan {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("plan {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => SAMPLE_PLANS.to_string(),
    };

    let mut results = Vec::new();
    let mut outputs = Vec::new();

    // 1. Configuration sanity
    results.extend(validate_configs(&config, &envelope));

    if let Some(path) = &args.check_layout {
        // 2a. A layout written earlier
        results.extend(check_layout_file(path));
    } else {
        // 2b. One section per plan
        for plan_id in plan_ids(&document, args.plan_id.as_deref()) {
            let (checks, output) =
                validate_plan(&document, plan_id.as_deref(), &config, &envelope, args.verbose);
            results.extend(checks);
            outputs.extend(output);
        }
    }

    // ── Output files ──
    if let Some(path) = &args.layout_out {
        let value = collect_output(&outputs, |o| serde_json::to_value(&o.layout));
        write_json(path, &value);
    }
    if let Some(path) = &args.walls_out {
        let value = collect_output(&outputs, |o| serde_json::to_value(&o.walls));
        write_json(path, &value);
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<LayoutConfig, String> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Plans to run: the requested one, every plan of a `plans` document, or the
/// document itself. Documents with unnamed plans only run their first plan.
fn plan_ids(document: &str, requested: Option<&str>) -> Vec<Option<String>> {
    if let Some(id) = requested {
        return vec![Some(id.to_string())];
    }
    let named: Option<Vec<Option<String>>> = serde_json::from_str::<Value>(document)
        .ok()
        .and_then(|v| v.get("plans").and_then(Value::as_array).cloned())
        .and_then(|plans| {
            plans
                .iter()
                .map(|p| p.get("plan_id").and_then(Value::as_str).map(|id| Some(id.to_string())))
                .collect()
        });
    match named {
        Some(ids) if !ids.is_empty() => ids,
        _ => vec![None],
    }
}

fn collect_output<F>(outputs: &[PlanOutput], to_value: F) -> Value
where
    F: Fn(&PlanOutput) -> serde_json::Result<Value>,
{
    let mut map = serde_json::Map::new();
    for o in outputs {
        match to_value(o) {
            Ok(v) => {
                map.insert(o.label.clone(), v);
            }
            Err(e) => log::warn!("could not serialise {}: {}", o.label, e),
        }
    }
    if map.len() == 1 {
        map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
    } else {
        Value::Object(map)
    }
}

fn write_json(path: &Path, value: &Value) {
    let written = serde_json::to_string_pretty(value)
        .map_err(|e| e.to_string())
        .and_then(|text| fs::write(path, text).map_err(|e| e.to_string()));
    match written {
        Ok(()) => println!("wrote {}", path.display()),
        Err(e) => eprintln!("could not write {}: {}", path.display(), e),
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_configs(config: &LayoutConfig, envelope: &EnvelopeConfig) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let checks = [
        ("layout_config_valid", validate_config(config)),
        ("envelope_config_valid", validate_envelope_config(envelope)),
    ];
    checks
        .into_iter()
        .map(|(name, errors)| TestResult {
            name: name.into(),
            passed: errors.is_empty(),
            detail: if errors.is_empty() {
                "configuration is valid".into()
            } else {
                format!("{:?}", errors)
            },
        })
        .collect()
}

// ── 2. Plans ────────────────────────────────────────────────────────────

fn validate_plan(
    document: &str,
    plan_id: Option<&str>,
    config: &LayoutConfig,
    envelope: &EnvelopeConfig,
    verbose: bool,
) -> (Vec<TestResult>, Option<PlanOutput>) {
    let label = plan_id.unwrap_or("plan").to_string();
    println!("--- Plan {} ---", label);
    let mut results = Vec::new();

    let run = parse_plan(document, plan_id).and_then(|plan| generate_layout(&plan, config));
    let run: LayoutRun = match run {
        Ok(run) => run,
        Err(e) => {
            results.push(TestResult {
                name: format!("{}_generate", label),
                passed: false,
                detail: e.to_string(),
            });
            return (results, None);
        }
    };
    let layout = &run.layout;
    let diag = &run.diagnostics;

    results.push(TestResult {
        name: format!("{}_generate", label),
        passed: true,
        detail: format!(
            "{} rooms, {} doors, score {}",
            layout.rooms.len(),
            layout.doors.len(),
            layout.quality_score
        ),
    });

    let rects: Vec<(&str, Rect)> = layout
        .rooms
        .iter()
        .map(|r| (r.room_id.as_str(), Rect::new(r.x, r.y, r.width, r.height)))
        .collect();
    let b = &layout.bounds;
    let bounds = Rect::from_corners(b.xmin, b.ymin, b.xmax, b.ymax);

    let outside: Vec<&str> = rects
        .iter()
        .filter(|(_, r)| !r.inside_eps(&bounds))
        .map(|(k, _)| *k)
        .collect();
    results.push(TestResult {
        name: format!("{}_rooms_in_bounds", label),
        passed: outside.is_empty(),
        detail: if outside.is_empty() {
            "all rooms inside the buildable area".into()
        } else {
            format!("outside: {:?}", outside)
        },
    });

    let mut overlaps = Vec::new();
    for (i, (ka, ra)) in rects.iter().enumerate() {
        for (kb, rb) in &rects[i + 1..] {
            if ra.overlaps_eps(rb) {
                overlaps.push(format!("{}/{}", ka, kb));
            }
        }
    }
    results.push(TestResult {
        name: format!("{}_no_overlaps", label),
        passed: overlaps.is_empty(),
        detail: if overlaps.is_empty() {
            "no overlapping rooms".into()
        } else {
            format!("overlapping: {:?}", overlaps)
        },
    });

    let errors: Vec<String> = diag.errors().map(|v| v.message.clone()).collect();
    results.push(TestResult {
        name: format!("{}_validation", label),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} warnings", diag.violations.len())
        } else {
            errors.join("; ")
        },
    });

    results.push(record_check(&format!("{}_layout_record", label), layout));

    if verbose {
        println!(
            "  refine misses {}, overlap cap hits {}, corridors +{} -{} (clipped {}, dropped {}), settled {}, unsettled {}",
            diag.refine_misses,
            diag.overlap_cap_hits(),
            diag.corridors_inserted,
            diag.corridors_merged,
            diag.corridors_clipped,
            diag.corridors_dropped,
            diag.rooms_settled,
            diag.rooms_unsettled
        );
        if let Some(strategy) = diag.repack {
            println!(
                "  repacked with {:?}: {} rooms moved, {} of them locked",
                strategy, diag.rooms_repacked, diag.locked_relocated
            );
        }
    }

    // Same input, same output
    let again = parse_plan(document, plan_id).and_then(|plan| generate_layout(&plan, config));
    results.push(TestResult {
        name: format!("{}_deterministic", label),
        passed: again.as_ref().is_ok_and(|r| r.layout == *layout),
        detail: "second run produces the identical layout".into(),
    });

    // Envelope
    let cells = cells_from_layout(layout);
    let walls = build_envelope(&cells, envelope);
    let outer = walls.iter().filter(|w| w.kind == WallKind::Outer).count();
    let inner = walls.len() - outer;
    let ordered = walls[..outer].iter().all(|w| w.kind == WallKind::Outer);
    results.push(TestResult {
        name: format!("{}_envelope", label),
        passed: (layout.rooms.is_empty() || outer >= 4) && ordered,
        detail: format!("{} outer, {} inner segments", outer, inner),
    });

    let plain = EnvelopeConfig {
        offset_outer: false,
        ..envelope.clone()
    };
    let unshifted = build_envelope(&cells, &plain);
    results.push(TestResult {
        name: format!("{}_merge_idempotent", label),
        passed: merge_walls(&unshifted) == unshifted,
        detail: "merging merged walls changes nothing".into(),
    });

    let shifted = offset_outer_walls(&unshifted, &cells, envelope.wall_thickness);
    let same_inner = shifted
        .iter()
        .zip(&unshifted)
        .filter(|(_, w)| w.kind == WallKind::Inner)
        .all(|(a, b)| a == b);
    results.push(TestResult {
        name: format!("{}_offset_keeps_inner", label),
        passed: same_inner,
        detail: "outer offset leaves inner walls alone".into(),
    });

    (results, Some(PlanOutput { label, layout: run.layout, walls }))
}

// ── 3. Layout records ───────────────────────────────────────────────────

/// Serialise `layout`, read it back and run the record checks on the copy.
fn record_check(name: &str, layout: &Layout) -> TestResult {
    let copy = serde_json::to_string(layout)
        .and_then(|text| serde_json::from_str::<Layout>(&text))
        .map_err(|e| e.to_string());
    match copy {
        Ok(copy) => record_result(name, &copy),
        Err(e) => TestResult {
            name: name.into(),
            passed: false,
            detail: format!("layout does not round-trip: {}", e),
        },
    }
}

fn record_result(name: &str, layout: &Layout) -> TestResult {
    let errors: Vec<String> = validate_layout_record(layout)
        .into_iter()
        .filter(|v| v.severity == Severity::Error)
        .map(|v| v.message)
        .collect();
    TestResult {
        name: name.into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} rooms, {} doors, all references resolve", layout.rooms.len(), layout.doors.len())
        } else {
            errors.join("; ")
        },
    }
}

/// Check every layout in a file written by `--layout-out`: a single layout,
/// or an object of layouts keyed by plan id.
fn check_layout_file(path: &Path) -> Vec<TestResult> {
    println!("--- Layout file {} ---", path.display());
    let value = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
    let value = match value {
        Ok(v) => v,
        Err(e) => {
            return vec![TestResult {
                name: "layout_file".into(),
                passed: false,
                detail: format!("{}: {}", path.display(), e),
            }]
        }
    };

    let entries: Vec<(String, Value)> = match value {
        Value::Object(map) if !map.contains_key("rooms") => map.into_iter().collect(),
        single => vec![("layout".to_string(), single)],
    };
    entries
        .into_iter()
        .map(|(label, v)| {
            let name = format!("{}_layout_record", label);
            match serde_json::from_value::<Layout>(v) {
                Ok(layout) => record_result(&name, &layout),
                Err(e) => TestResult {
                    name,
                    passed: false,
                    detail: format!("not a layout: {}", e),
                },
            }
        })
        .collect()
}
