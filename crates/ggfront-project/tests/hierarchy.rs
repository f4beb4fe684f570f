use std::path::{Path, PathBuf};

use ggfront_project::{Hierarchy, HierarchyStatus, TopSelection};
use ggfront_syntax::{analyze, SourceAnalysis};

fn sources<T: AsRef<str>>(files: &[(&str, T)]) -> Vec<SourceAnalysis> {
    files
        .iter()
        .enumerate()
        .map(|(index, (path, text))| analyze(Path::new(path), index + 1, text.as_ref()))
        .collect()
}

fn entity(name: &str, components: &[&str]) -> String {
    let mut text = format!("entity {name} is\nend {name};\narchitecture rtl of {name} is\n");
    for component in components {
        text.push_str(&format!("  component {component}\n  end component;\n"));
    }
    text.push_str("begin\nend rtl;\n");
    text
}

fn rows(hierarchy: &Hierarchy) -> Vec<(String, usize, bool, bool)> {
    hierarchy
        .items()
        .iter()
        .map(|item| (item.name.to_string(), item.depth, item.valid, item.is_top))
        .collect()
}

#[test]
fn builds_tree_and_picks_largest_root() {
    let tb = entity("tb", &["adder", "counter"]);
    let adder = entity("adder", &["half_adder"]);
    let half = entity("half_adder", &[]);
    let counter = entity("counter", &[]);
    let orphan = entity("orphan", &[]);
    let analyses = sources(&[
        ("lib/orphan.vhd", &orphan),
        ("lib/adder.vhd", &adder),
        ("lib/half_adder.vhd", &half),
        ("lib/counter.vhd", &counter),
        ("tb/tb.vhd", &tb),
    ]);

    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());

    assert_eq!(hierarchy.status(), HierarchyStatus::Resolved);
    assert_eq!(
        rows(&hierarchy),
        vec![
            ("tb".into(), 0, true, true),
            ("adder".into(), 1, true, false),
            ("half_adder".into(), 2, true, false),
            ("counter".into(), 1, true, false),
            ("orphan".into(), 0, true, false),
        ]
    );
    assert_eq!(hierarchy.top(), Some("tb"));
    assert!(hierarchy.selection().auto);
    assert_eq!(
        hierarchy.wave_path(),
        Some(PathBuf::from("tb").join("tb.vcd").as_path())
    );
    let adder_row = &hierarchy.items()[1];
    assert_eq!(adder_row.short_path.as_deref(), Some("adder.vhd"));
    assert_eq!(adder_row.long_path.as_deref(), Some(Path::new("lib/adder.vhd")));
}

#[test]
fn depth_only_grows_on_first_descent() {
    let analyses = sources(&[
        ("a.vhd", &entity("a", &["b", "c"])),
        ("b.vhd", &entity("b", &["d"])),
        ("c.vhd", &entity("c", &[])),
        ("d.vhd", &entity("d", &[])),
    ]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());
    let depths: Vec<_> = hierarchy.items().iter().map(|item| item.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 1]);
    assert_eq!(hierarchy.items().iter().filter(|item| item.is_top).count(), 1);
}

#[test]
fn explicit_top_is_kept_while_declared() {
    let analyses = sources(&[
        ("tb.vhd", &entity("tb", &["dut"])),
        ("dut.vhd", &entity("dut", &[])),
    ]);

    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::explicit("dut"));
    assert_eq!(hierarchy.top(), Some("dut"));
    assert!(!hierarchy.selection().auto);
    assert_eq!(hierarchy.wave_path(), Some(Path::new("dut.vcd")));

    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::explicit("gone"));
    assert_eq!(hierarchy.top(), Some("tb"));
    assert!(hierarchy.selection().auto);
}

#[test]
fn duplicate_entities_list_every_owner() {
    let analyses = sources(&[
        ("a/adder.vhd", &entity("adder", &[])),
        ("tb.vhd", &entity("tb", &["adder"])),
        ("b/adder.vhd", &entity("adder", &[])),
        ("c/adder2.vhd", &entity("adder", &[])),
    ]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::explicit("tb"));

    assert_eq!(hierarchy.status(), HierarchyStatus::Duplicates);
    assert_eq!(hierarchy.top(), None);
    assert_eq!(hierarchy.wave_path(), None);
    let items = hierarchy.items();
    assert_eq!(items[0].name, "<!> Entity が重複して定義されています．");
    assert!(!items[0].valid);
    let owners: Vec<_> = items[1..]
        .iter()
        .map(|item| (item.name.as_str(), item.depth, item.short_path.as_deref()))
        .collect();
    assert_eq!(
        owners,
        vec![
            ("adder", 1, Some("adder.vhd")),
            ("adder", 1, Some("adder.vhd")),
            ("adder", 1, Some("adder2.vhd")),
        ]
    );
    assert_eq!(items[1].long_path.as_deref(), Some(Path::new("a/adder.vhd")));
}

#[test]
fn mutual_reference_is_cyclic() {
    let analyses = sources(&[
        ("a.vhd", &entity("a", &["b"])),
        ("b.vhd", &entity("b", &["a"])),
    ]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());
    assert_eq!(hierarchy.status(), HierarchyStatus::Cyclic);
    assert_eq!(hierarchy.items().len(), 1);
    assert_eq!(hierarchy.items()[0].name, "<!> Entity の循環参照を検出しました．");
    assert_eq!(hierarchy.top(), None);
}

#[test]
fn cycle_below_a_root_aborts_everything() {
    let analyses = sources(&[
        ("top.vhd", &entity("top", &["a"])),
        ("a.vhd", &entity("a", &["b"])),
        ("b.vhd", &entity("b", &["a"])),
        ("other.vhd", &entity("other", &[])),
    ]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());
    assert_eq!(hierarchy.status(), HierarchyStatus::Cyclic);
    assert_eq!(hierarchy.items().len(), 1);
}

#[test]
fn no_entities_is_reported() {
    let analyses = sources(&[("pkg.vhd", "package p is\nend p;\n")]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());
    assert_eq!(hierarchy.status(), HierarchyStatus::NoModules);
    assert_eq!(hierarchy.items()[0].name, "<!> Entity が見つかりません．");
    assert!(!hierarchy.is_resolved());
}

#[test]
fn undeclared_component_is_an_invalid_leaf() {
    let analyses = sources(&[("tb.vhd", &entity("tb", &["missing"]))]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());

    assert!(hierarchy.is_resolved());
    let leaf = &hierarchy.items()[1];
    assert_eq!(leaf.name, "missing");
    assert!(!leaf.valid);
    assert_eq!(leaf.short_path.as_deref(), Some("???"));
    assert_eq!(leaf.long_path, None);
}

#[test]
fn referenced_follows_the_top_subtree() {
    let analyses = sources(&[
        ("tb.vhd", &entity("tb", &["dut"])),
        ("dut.vhd", &entity("dut", &[])),
        ("spare.vhd", &entity("spare", &[])),
    ]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::default());

    assert!(hierarchy.referenced("tb"));
    assert!(hierarchy.referenced("dut"));
    assert!(!hierarchy.referenced("spare"));
    assert!(!hierarchy.referenced("nothing"));

    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::explicit("spare"));
    assert!(hierarchy.referenced("spare"));
    assert!(!hierarchy.referenced("dut"));
}

#[test]
fn vhdl2008_flag_is_any_source() {
    let newer = format!("use ieee.numeric_std_unsigned.all;\n{}", entity("n", &[]));
    let analyses = sources(&[("o.vhd", &entity("o", &[])), ("n.vhd", &newer)]);
    assert!(Hierarchy::resolve(&analyses, &TopSelection::default()).uses_vhdl2008());
}

#[test]
fn reference_resolution_marks_data_files() {
    let tb = "entity tb is\nend tb;\narchitecture sim of tb is\n  file stim : text open read_mode is \"stim.txt\";\nbegin\nend sim;\n";
    let spare = "entity spare is\nend spare;\narchitecture a of spare is\n  file out_f : text open write_mode is \"o.txt\";\nbegin\nend a;\n";
    let mut analyses = sources(&[("tb.vhd", tb), ("spare.vhd", spare)]);
    let hierarchy = Hierarchy::resolve(&analyses, &TopSelection::explicit("tb"));

    for analysis in &mut analyses {
        analysis.resolve_references(|entity| hierarchy.referenced(entity));
    }
    assert!(analyses[0].in_files[0].referenced);
    assert!(!analyses[1].out_files[0].referenced);
}
