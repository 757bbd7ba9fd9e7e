//! Compilation-unit dependency graph built from loader descriptors + petgraph
//!
//! # Design
//!
//! - **Directed graph**: `A → B` means "A imports B"
//! - **Nodes**: compilation units (workspace packages, their test-build
//!   variants, and reachable dependencies)
//! - **Indices**: unit ID, import path (one path may hold several variants),
//!   exact member file, and containing directory (fallback for files that
//!   are not a recognized member of any unit)
//! - **Traversal**: iterative worklist with a visited set; a unit is never
//!   expanded twice, so diamond-shaped graphs stay O(V + E)
//!
//! The graph is immutable once built. Queries take `&self` and only
//! allocate result containers, so concurrent readers need no locking.

use crate::core::error::{RippleError, RippleResult, ResultExt};
use crate::loader::{PackageLoader, PackageSpec};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// A compilation unit: a node in the dependency graph.
#[derive(Debug, Clone)]
pub struct Package {
  /// Process-unique identity. Distinguishes build variants (a package built
  /// normally vs. as an integration-test binary) that share an import path.
  pub id: String,

  /// The logical name other units import. Not unique across variants.
  pub import_path: String,

  pub version: Option<semver::Version>,

  /// Member file paths, used to map a changed file back to its owner.
  pub files: Vec<PathBuf>,

  /// True for integration-test builds of a package.
  pub test_variant: bool,
}

impl Package {
  /// A stand-in unit carrying only an import path. Produced when decoding a
  /// serialized report; has no files and no edges.
  pub fn path_only(path: impl Into<String>) -> Self {
    let path = path.into();
    Self {
      id: path.clone(),
      import_path: path,
      version: None,
      files: Vec::new(),
      test_variant: false,
    }
  }
}

/// Result of one worklist traversal, tracked for the visited-node bound.
struct Traversal {
  /// Units reached over edges (the query result).
  found: HashSet<NodeIndex>,
  /// Units whose edge set has been unioned in. Shared across a batch so
  /// nothing is re-expanded when direct changes share dependents.
  expanded: HashSet<NodeIndex>,
  /// Number of expansions performed; bounded by the node count.
  expansions: usize,
}

impl Traversal {
  fn new() -> Self {
    Self {
      found: HashSet::new(),
      expanded: HashSet::new(),
      expansions: 0,
    }
  }
}

/// Dependency graph over all loaded compilation units.
#[derive(Debug)]
pub struct DependencyGraph {
  /// The unit arena. Edges point importer → imported.
  graph: DiGraph<Package, ()>,

  /// Index: unit ID → node. IDs are unique; this is the canonical store.
  id_to_node: HashMap<String, NodeIndex>,

  /// Index: import path → variants at that path, in registration order.
  /// Path-level edge queries union across all variants.
  path_to_nodes: HashMap<String, Vec<NodeIndex>>,

  /// Index: exact member file → owning unit. When a base unit and its test
  /// variant both claim a path, the non-test variant owns it.
  file_to_node: HashMap<PathBuf, NodeIndex>,

  /// Index: containing directory → units with a member file there. Fallback
  /// for changed files that are not a recognized member of any unit.
  dir_to_nodes: HashMap<PathBuf, HashSet<NodeIndex>>,
}

impl DependencyGraph {
  /// Load descriptors through `loader` and build the graph.
  ///
  /// A hard loader failure is wrapped and propagated; there is no
  /// partial-graph fallback.
  pub fn build(
    loader: &dyn PackageLoader,
    include: &[String],
    features: &[String],
  ) -> RippleResult<Self> {
    let specs = loader
      .load(include, features)
      .context("loading package graph")?;
    Self::from_specs(specs)
  }

  /// Build the graph from flat unit descriptors.
  ///
  /// Each ID registers exactly once regardless of how many descriptors
  /// carry it; re-adding an ID returns to the existing node without
  /// re-processing edges. Construction fails on an import edge naming an
  /// undescribed ID, and fails loudly if the unit graph contains a cycle:
  /// the compiler that accepted the original build forbids import cycles,
  /// so one here means the loader handed us garbage.
  pub fn from_specs(specs: Vec<PackageSpec>) -> RippleResult<Self> {
    let mut graph = DiGraph::new();
    let mut id_to_node: HashMap<String, NodeIndex> = HashMap::new();
    let mut path_to_nodes: HashMap<String, Vec<NodeIndex>> = HashMap::new();
    let mut file_to_node: HashMap<PathBuf, NodeIndex> = HashMap::new();
    let mut dir_to_nodes: HashMap<PathBuf, HashSet<NodeIndex>> = HashMap::new();
    let mut pending_edges: Vec<(NodeIndex, String)> = Vec::new();

    for spec in specs {
      if id_to_node.contains_key(&spec.id) {
        // Seen this unit already; edges were recorded the first time.
        continue;
      }

      let PackageSpec {
        id,
        import_path,
        version,
        source_files,
        other_files,
        imports,
        test_variant,
      } = spec;

      let mut files = source_files;
      files.extend(other_files);

      let node = graph.add_node(Package {
        id: id.clone(),
        import_path: import_path.clone(),
        version,
        files,
        test_variant,
      });
      id_to_node.insert(id, node);
      path_to_nodes.entry(import_path).or_default().push(node);

      for file in &graph[node].files {
        match file_to_node.entry(file.clone()) {
          Entry::Vacant(v) => {
            v.insert(node);
          }
          Entry::Occupied(mut o) => {
            // Two variants legitimately claim the same path; the non-test
            // variant owns it.
            let current = *o.get();
            if graph[current].test_variant && !test_variant {
              o.insert(node);
            }
          }
        }
        if let Some(dir) = file.parent() {
          dir_to_nodes.entry(dir.to_path_buf()).or_default().insert(node);
        }
      }

      for dep_id in imports {
        pending_edges.push((node, dep_id));
      }
    }

    for (from, dep_id) in pending_edges {
      let to = id_to_node.get(&dep_id).ok_or_else(|| {
        RippleError::load(format!(
          "package '{}' imports undescribed unit '{}'",
          graph[from].id, dep_id
        ))
      })?;
      graph.add_edge(from, *to, ());
    }

    if let Err(cycle) = algo::toposort(&graph, None) {
      return Err(RippleError::load(format!(
        "import cycle detected involving '{}'",
        graph[cycle.node_id()].id
      )));
    }

    Ok(Self {
      graph,
      id_to_node,
      path_to_nodes,
      file_to_node,
      dir_to_nodes,
    })
  }

  /// Number of loaded units.
  #[allow(dead_code)]
  pub fn package_count(&self) -> usize {
    self.graph.node_count()
  }

  /// Direct dependencies of the units at `import_path`, unioned across
  /// variants.
  ///
  /// TODO: Used by a future `cargo ripple deps <path>` inspection mode
  #[allow(dead_code)]
  pub fn dependencies(&self, import_path: &str) -> RippleResult<Vec<&Package>> {
    self
      .collect(import_path, Direction::Outgoing, false)
      .map(|t| self.resolve(&t.found))
  }

  /// Full transitive dependency closure of the units at `import_path`.
  ///
  /// TODO: Used by a future `cargo ripple deps <path>` inspection mode
  #[allow(dead_code)]
  pub fn transitive_dependencies(&self, import_path: &str) -> RippleResult<Vec<&Package>> {
    self
      .collect(import_path, Direction::Outgoing, true)
      .map(|t| self.resolve(&t.found))
  }

  /// Direct dependents (importers) of the units at `import_path`, unioned
  /// across variants.
  ///
  /// TODO: Used by a future `cargo ripple deps <path>` inspection mode
  #[allow(dead_code)]
  pub fn dependents(&self, import_path: &str) -> RippleResult<Vec<&Package>> {
    self
      .collect(import_path, Direction::Incoming, false)
      .map(|t| self.resolve(&t.found))
  }

  /// Full transitive dependent closure of the units at `import_path`.
  pub fn transitive_dependents(&self, import_path: &str) -> RippleResult<Vec<&Package>> {
    self
      .collect(import_path, Direction::Incoming, true)
      .map(|t| self.resolve(&t.found))
  }

  /// Map changed file paths to the directly affected units and the full
  /// transitive affected set (direct units plus everything that depends on
  /// them).
  ///
  /// Per file: exact member lookup first; failing that, every unit with a
  /// member file in the same directory is directly affected; failing both,
  /// the file is outside the loaded graph and contributes nothing.
  pub fn affected_packages(
    &self,
    files: &[PathBuf],
  ) -> RippleResult<(Vec<&Package>, Vec<&Package>)> {
    let mut direct: HashSet<NodeIndex> = HashSet::new();
    for file in files {
      if let Some(&node) = self.file_to_node.get(file) {
        direct.insert(node);
        continue;
      }
      if let Some(nodes) = file.parent().and_then(|d| self.dir_to_nodes.get(d)) {
        direct.extend(nodes.iter().copied());
      }
    }

    // One shared traversal for the whole batch: dependents common to
    // several direct units expand exactly once.
    let mut traversal = Traversal::new();
    for &node in &direct {
      let path = self.graph[node].import_path.clone();
      self.collect_into(&path, Direction::Incoming, true, &mut traversal)?;
    }

    let mut all = direct.clone();
    all.extend(traversal.found.iter().copied());

    Ok((self.resolve(&direct), self.resolve(&all)))
  }

  fn resolve(&self, nodes: &HashSet<NodeIndex>) -> Vec<&Package> {
    nodes.iter().map(|&n| &self.graph[n]).collect()
  }

  fn collect(
    &self,
    import_path: &str,
    direction: Direction,
    transitive: bool,
  ) -> RippleResult<Traversal> {
    let mut traversal = Traversal::new();
    self.collect_into(import_path, direction, transitive, &mut traversal)?;
    Ok(traversal)
  }

  /// Worklist traversal from the variants at `import_path`.
  ///
  /// The start variants are expanded but not reported; only units reached
  /// over edges land in `found`. Closure expansion happens at the path
  /// level: discovering a unit enqueues every variant sharing its import
  /// path, because edges of sibling variants reach the same consumers.
  fn collect_into(
    &self,
    import_path: &str,
    direction: Direction,
    transitive: bool,
    traversal: &mut Traversal,
  ) -> RippleResult<()> {
    let roots = self
      .path_to_nodes
      .get(import_path)
      .ok_or_else(|| RippleError::unknown_package(import_path))?;

    let mut work: VecDeque<NodeIndex> = VecDeque::new();
    for &root in roots {
      if traversal.expanded.insert(root) {
        work.push_back(root);
      }
    }

    while let Some(node) = work.pop_front() {
      traversal.expansions += 1;
      for neighbor in self.graph.neighbors_directed(node, direction) {
        if traversal.found.insert(neighbor) && transitive {
          for &variant in &self.path_to_nodes[&self.graph[neighbor].import_path] {
            if traversal.expanded.insert(variant) {
              work.push_back(variant);
            }
          }
        }
      }
    }

    Ok(())
  }
}
