//! Dependency collection over a whole patch tree.

use crate::atom::Atom;
use crate::model::{DeclareFlag, Dependencies, Dependency, Node, Patch};

/// Everything the patch needs from outside itself, in discovery order.
///
/// Starts from the patch's own set (the `#X declare` statements) and adds
/// `declare` objects found on any canvas and the library prefix of classes
/// such as `cyclone/comb~`. Classes given by a relative or absolute path
/// (`../abs/voice`) contribute their directory as a search path. Nothing is
/// looked up on disk.
pub fn collect_dependencies(patch: &Patch) -> Dependencies {
    let mut found = patch.dependencies.clone();
    let before = found.len();

    for canvas in patch.all_canvases() {
        for node in &canvas.nodes {
            let Node::Object(object) = node else {
                continue;
            };
            if object.class_name == "declare" {
                declared(&object.args, &mut found);
            } else if let Some(dependency) = class_dependency(&object.class_name) {
                found.insert(dependency);
            }
        }
    }

    log::debug!(
        "`{}`: {} dependencies ({} from objects)",
        patch.name,
        found.len(),
        found.len() - before
    );
    found
}

fn declared(args: &[Atom], found: &mut Dependencies) {
    for pair in args.chunks_exact(2) {
        let (Some(flag), value) = (pair[0].as_symbol().and_then(DeclareFlag::parse), &pair[1])
        else {
            continue;
        };
        found.insert(flag.dependency(&value.to_word()));
    }
}

fn class_dependency(class_name: &str) -> Option<Dependency> {
    let (dir, file) = class_name.rsplit_once('/')?;
    if file.is_empty() {
        return None;
    }
    if class_name.starts_with('.') || class_name.starts_with('/') {
        let dir = if dir.is_empty() { "/" } else { dir };
        return Some(Dependency::Path(dir.to_string()));
    }
    let (lib, _) = class_name.split_once('/')?;
    (!lib.is_empty()).then(|| Dependency::Lib(lib.to_string()))
}
