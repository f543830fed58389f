use std::fmt::Write as _;

use layer_tl_plan::{DeclarationPlan, PlanSet, Role, SizeFormula};

/// Pretty JSON of the whole plan set.
pub fn render_json(plans: &PlanSet) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(plans)?;
    out.push('\n');
    Ok(out)
}

/// One line per declaration: identifier, schema, name, display name, role, size.
pub fn render_summary(plans: &PlanSet) -> String {
    let mut out = String::new();
    for schema in &plans.schemas {
        let layer = schema.layer.map(|l| format!(" layer {l}")).unwrap_or_default();
        let _ = writeln!(
            out,
            "# {}{}: {} constructors, {} methods",
            schema.name, layer, schema.constructors, schema.methods
        );
    }
    for decl in &plans.declarations {
        let _ = writeln!(out, "{}", summary_line(decl));
    }
    out
}

fn summary_line(decl: &DeclarationPlan) -> String {
    let role = match &decl.role {
        Role::Singleton => "singleton".to_owned(),
        Role::EnumMember { label, .. } => format!("enum:{label}"),
        Role::InterfaceMember => "member".to_owned(),
        Role::Method => "method".to_owned(),
        Role::Builtin => "builtin".to_owned(),
    };
    let size = match &decl.wire.size {
        SizeFormula::Constant { size } => size.to_string(),
        SizeFormula::Dynamic { base, probes } => format!("{base}+{}", probes.len()),
    };
    let recursive = if decl.recursive { " recursive" } else { "" };
    format!(
        "{:08x} {:<8} {:<40} {:<32} {:<16} size={size}{recursive}",
        decl.id, decl.schema, decl.name, decl.display_name, role
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_tl_parser::{Schema, SchemaConfig};
    use layer_tl_plan::{Config, compile};

    #[test]
    fn summary_has_one_line_per_declaration() {
        let src = "\
// LAYER 7
inputPeerEmpty#7f3b18ea = InputPeer;
inputPeerSelf#7da07ec9 = InputPeer;
user#4 id:long name:string = User;
";
        let schema = Schema::from_tl_str(src, SchemaConfig::default()).unwrap();
        let plans = compile(&[schema], &Config::default()).unwrap();
        let summary = render_summary(&plans);
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "# api layer 7: 3 constructors, 0 methods");
        assert!(lines[1].starts_with("7f3b18ea api"));
        assert!(lines[1].contains("enum:Empty"));
        assert!(lines[3].ends_with("size=12+1"));
    }

    #[test]
    fn json_is_pretty() {
        let schema = Schema::from_tl_str("pair#1 a:int = Pair;", SchemaConfig::default()).unwrap();
        let plans = compile(&[schema], &Config::default()).unwrap();
        let json = render_json(&plans).unwrap();
        assert!(json.starts_with("{\n"));
        assert!(json.contains("\"display_name\": \"Pair\""));
    }
}
