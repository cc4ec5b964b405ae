//! DGML (Directed Graph Markup Language) export.
//!
//! Both renderers are deterministic: nodes follow graph or declaration
//! order and links follow their source nodes.

use std::fmt;

use quick_xml::escape::escape;

use crate::include_graph::{IncludeGraph, NodeKind};
use crate::model::Solution;

const NAMESPACE: &str = "http://schemas.microsoft.com/vs/2009/dgml";

/// Render an include graph: one node per graph node, categorised by kind,
/// and one link per include edge.
#[must_use]
pub fn include_graph(graph: &IncludeGraph) -> String {
    IncludeGraphDgml(graph).to_string()
}

/// Render the direct project references of a solution.
#[must_use]
pub fn project_dependencies(solution: &Solution) -> String {
    ProjectDgml(solution).to_string()
}

struct IncludeGraphDgml<'g>(&'g IncludeGraph);

impl fmt::Display for IncludeGraphDgml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        open(f)?;
        f.write_str("  <Nodes>\n")?;
        for (index, node) in graph.nodes().iter().enumerate() {
            let label = node.path.file_name().unwrap_or(node.path.as_str());
            writeln!(
                f,
                r#"    <Node Id="{index}" Label="{}" Category="{}" Reference="{}" />"#,
                escape(label),
                category(&node.kind),
                escape(node.path.as_str()),
            )?;
        }
        f.write_str("  </Nodes>\n  <Links>\n")?;
        for (parent, child) in graph.edges() {
            writeln!(
                f,
                r#"    <Link Source="{}" Target="{}" />"#,
                parent.index(),
                child.index()
            )?;
        }
        f.write_str("  </Links>\n  <Categories>\n")?;
        for name in ["Source", "Resolved", "Unresolved", "BackReference", "Excluded"] {
            writeln!(f, r#"    <Category Id="{name}" />"#)?;
        }
        f.write_str("  </Categories>\n")?;
        close(f)
    }
}

const fn category(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Source => "Source",
        NodeKind::Resolved => "Resolved",
        NodeKind::Unresolved { .. } => "Unresolved",
        NodeKind::BackReference { .. } => "BackReference",
        NodeKind::Excluded => "Excluded",
    }
}

struct ProjectDgml<'s>(&'s Solution);

impl fmt::Display for ProjectDgml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solution = self.0;
        open(f)?;
        f.write_str("  <Nodes>\n")?;
        for project in solution.projects.values() {
            writeln!(
                f,
                r#"    <Node Id="{}" Label="{}" Reference="{}" />"#,
                project.id,
                escape(project.name.as_str()),
                escape(project.path.as_str()),
            )?;
        }
        f.write_str("  </Nodes>\n  <Links>\n")?;
        for project in solution.projects.values() {
            for reference in &project.references {
                writeln!(f, r#"    <Link Source="{}" Target="{reference}" />"#, project.id)?;
            }
        }
        f.write_str("  </Links>\n")?;
        close(f)
    }
}

fn open(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
    writeln!(f, r#"<DirectedGraph xmlns="{NAMESPACE}">"#)
}

fn close(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("</DirectedGraph>\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include_graph::get_include_graph;
    use crate::model::{ConfigurationName, ConfigurationSettings, Project, ProjectId};
    use anyhow::Result;
    use camino::{Utf8Path, Utf8PathBuf};
    use indexmap::IndexMap;
    use rstest::rstest;
    use test_support::Tree;

    fn project(name: &str, guid: &str, root: &Utf8Path, references: &[&str]) -> Result<Project> {
        let mut configurations = IndexMap::new();
        configurations.insert(ConfigurationName::new("Debug|x64"), ConfigurationSettings::default());
        Ok(Project {
            id: guid.parse()?,
            name: name.to_owned(),
            path: root.join(format!("{name}.vcxproj")),
            root: root.to_path_buf(),
            sources: vec![Utf8PathBuf::from("main.cpp")],
            headers: Vec::new(),
            configurations,
            default_configuration: Some(ConfigurationName::new("Debug|x64")),
            references: references
                .iter()
                .map(|id| id.parse())
                .collect::<Result<Vec<ProjectId>, _>>()?,
        })
    }

    #[rstest]
    fn include_graph_lists_nodes_links_and_categories() -> Result<()> {
        let tree = Tree::new()?;
        tree.write_all(&[
            ("App/main.cpp", "#include \"a&b.h\"\n#include \"gone.h\"\n"),
            ("App/a&b.h", "#include \"main.cpp\"\n"),
        ])?;
        let app = project("App", "{11111111-1111-1111-1111-111111111111}", &tree.path("App"), &[])?;
        let graph = get_include_graph(Utf8Path::new("main.cpp"), &app, "Debug|x64")?;

        let dgml = include_graph(&graph);
        assert!(dgml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<DirectedGraph"));
        assert!(dgml.contains(r#"<Node Id="0" Label="main.cpp" Category="Source""#));
        assert!(dgml.contains(r#"Label="a&amp;b.h" Category="Resolved""#));
        assert!(dgml.contains(r#"<Node Id="2" Label="main.cpp" Category="BackReference""#));
        assert!(dgml.contains(r#"<Node Id="3" Label="gone.h" Category="Unresolved""#));
        assert_eq!(dgml.matches("<Link ").count(), graph.edges().count());
        assert!(dgml.contains(r#"<Link Source="0" Target="1" />"#));
        assert!(dgml.trim_end().ends_with("</DirectedGraph>"));
        assert_eq!(dgml, include_graph(&graph));
        Ok(())
    }

    #[rstest]
    fn project_dependencies_link_direct_references() -> Result<()> {
        let root = Utf8Path::new("/work");
        let lib = project("Lib<Core>", "{22222222-2222-2222-2222-222222222222}", root, &[])?;
        let app = project(
            "App",
            "{11111111-1111-1111-1111-111111111111}",
            root,
            &["{22222222-2222-2222-2222-222222222222}"],
        )?;
        let solution = Solution {
            path: root.join("All.sln"),
            projects: [(app.id, app), (lib.id, lib)].into_iter().collect(),
            configurations: vec![ConfigurationName::new("Debug|x64")],
            project_configurations: IndexMap::new(),
            warnings: Vec::new(),
        };

        let dgml = project_dependencies(&solution);
        let app_node = dgml
            .find(r#"Id="{11111111-1111-1111-1111-111111111111}""#)
            .expect("app node");
        let lib_node = dgml.find("Label=\"Lib&lt;Core&gt;\"").expect("escaped lib node");
        assert!(app_node < lib_node);
        assert!(dgml.contains(
            r#"<Link Source="{11111111-1111-1111-1111-111111111111}" Target="{22222222-2222-2222-2222-222222222222}" />"#
        ));
        assert_eq!(dgml.matches("<Link ").count(), 1);
        Ok(())
    }
}
