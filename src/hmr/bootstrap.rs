//! `src/main.ts`: route bootstrapping through `hmrBootstrap` when HMR is on.

use super::{commit_checked, StepOutcome, StepResult};
use crate::edit::EditSet;
use crate::sg::{AstGrepError, PatternMatcher};
use crate::store::DocumentStore;
use crate::ts::{
    enclosing_statement, find_node, find_node_with_parent, find_nodes, first_child_of_kind,
    NodeKind, SyntaxTree,
};

pub const MAIN_TS: &str = "src/main.ts";

const HMR_SYMBOL: &str = "hmrBootstrap";
const HMR_MODULE: &str = "./hmr";
const ENVIRONMENT_SYMBOL: &str = "environment";
const ENVIRONMENT_MODULE: &str = "./environments/environment";
const DEFAULT_APP_MODULE: &str = "AppModule";

/// Import `hmrBootstrap` and replace the `platformBrowserDynamic()` statement
/// with a bootstrap that defers to it under `environment.hmr`.
pub fn patch_main<S: DocumentStore + ?Sized>(store: &mut S) -> StepOutcome {
    if !store.exists(MAIN_TS) {
        return Ok(StepResult::skipped(format!("{MAIN_TS} not found")));
    }

    let mut edits = store.begin_update(MAIN_TS)?;
    let matcher = PatternMatcher::new(edits.original());
    if matcher.has_match("hmrBootstrap($$$ARGS)") {
        return Ok(StepResult::AlreadyApplied {
            path: MAIN_TS.to_string(),
        });
    }
    let app_module = match matcher.find_unique("platformBrowserDynamic().bootstrapModule($MODULE)") {
        Ok(m) => m.captures.get("MODULE").cloned(),
        Err(AstGrepError::AmbiguousMatch { count, .. }) => {
            return Ok(StepResult::skipped(format!(
                "{count} bootstrapModule() calls in {MAIN_TS}"
            )));
        }
        Err(AstGrepError::NoMatch { .. }) => None,
    }
    .unwrap_or_else(|| DEFAULT_APP_MODULE.to_string());

    let tree = edits.parse()?;
    let Some(call) = find_node_with_parent(
        tree.root(),
        NodeKind::Identifier,
        "platformBrowserDynamic",
        NodeKind::CallExpression,
    ) else {
        return Ok(StepResult::skipped(format!(
            "no platformBrowserDynamic() call in {MAIN_TS}"
        )));
    };
    let Some(statement) =
        enclosing_statement(call).filter(|statement| statement.kind() == NodeKind::ExpressionStatement)
    else {
        return Ok(StepResult::skipped(format!(
            "platformBrowserDynamic() in {MAIN_TS} is not a bootstrap statement"
        )));
    };

    let had_imports = find_node(tree.root(), NodeKind::ImportStatement, None).is_some();
    let imported = insert_import(&mut edits, &tree, HMR_SYMBOL, HMR_MODULE)
        | insert_import(&mut edits, &tree, ENVIRONMENT_SYMBOL, ENVIRONMENT_MODULE);
    if imported && !had_imports {
        // Blank line between the new import block and the code.
        edits.insert_left(0, "\n");
    }
    edits
        .remove(statement.pos(), statement.end())
        .insert_right(statement.pos(), bootstrap_block(&app_module));

    commit_checked(store, edits)?;
    Ok(StepResult::Applied {
        path: MAIN_TS.to_string(),
    })
}

/// Queue an import of `symbol` from `module`, returning whether one was needed.
///
/// An existing named import from `module` gains the symbol; otherwise a new
/// import statement goes after the last import, or at the top of the file.
pub fn insert_import(edits: &mut EditSet, tree: &SyntaxTree, symbol: &str, module: &str) -> bool {
    let imports = find_nodes(tree.root(), NodeKind::ImportStatement, None);

    let from_module = imports.iter().copied().find(|import| {
        first_child_of_kind(*import, NodeKind::String)
            .is_some_and(|source| source.text().trim_matches(['"', '\'']) == module)
    });
    if let Some(import) = from_module {
        let specifiers = find_nodes(import, NodeKind::ImportSpecifier, None);
        let bound = specifiers.iter().any(|specifier| {
            specifier
                .children()
                .filter(|child| child.kind() == NodeKind::Identifier)
                .last()
                .is_some_and(|local| local.text() == symbol)
        });
        if bound {
            return false;
        }
        if let Some(last) = specifiers.last() {
            edits.insert_right(last.end(), format!(", {symbol}"));
            return true;
        }
        let brace = find_node(import, NodeKind::NamedImports, None)
            .and_then(|named| first_child_of_kind(named, NodeKind::OpenBrace));
        if let Some(brace) = brace {
            edits.insert_right(brace.end(), format!(" {symbol} "));
            return true;
        }
    }

    let statement = format!("import {{ {symbol} }} from '{module}';");
    match imports.last() {
        Some(last) => edits.insert_left(last.end(), format!("\n{statement}")),
        None => edits.insert_left(0, format!("{statement}\n")),
    };
    true
}

fn bootstrap_block(app_module: &str) -> String {
    format!(
        "const bootstrap = () => platformBrowserDynamic().bootstrapModule({app_module});

if (environment.hmr) {{
  if (module[ 'hot' ]) {{
    hmrBootstrap(module, bootstrap);
  }} else {{
    console.error('HMR is not enabled for webpack-dev-server!');
    console.log('Are you using the --hmr flag for ng serve?');
  }}
}} else {{
  bootstrap().catch(err => console.log(err));
}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const STOCK_MAIN: &str = "\
import { enableProdMode } from '@angular/core';
import { platformBrowserDynamic } from '@angular/platform-browser-dynamic';

import { AppModule } from './app/app.module';
import { environment } from './environments/environment';

if (environment.production) {
  enableProdMode();
}

platformBrowserDynamic().bootstrapModule(AppModule)
  .catch(err => console.log(err));
";

    const PATCHED_MAIN: &str = "\
import { enableProdMode } from '@angular/core';
import { platformBrowserDynamic } from '@angular/platform-browser-dynamic';

import { AppModule } from './app/app.module';
import { environment } from './environments/environment';
import { hmrBootstrap } from './hmr';

if (environment.production) {
  enableProdMode();
}

const bootstrap = () => platformBrowserDynamic().bootstrapModule(AppModule);

if (environment.hmr) {
  if (module[ 'hot' ]) {
    hmrBootstrap(module, bootstrap);
  } else {
    console.error('HMR is not enabled for webpack-dev-server!');
    console.log('Are you using the --hmr flag for ng serve?');
  }
} else {
  bootstrap().catch(err => console.log(err));
}
";

    fn imports_after(source: &str, symbol: &str, module: &str) -> (bool, String) {
        let mut edits = EditSet::new(MAIN_TS, source);
        let tree = edits.parse().unwrap();
        let queued = insert_import(&mut edits, &tree, symbol, module);
        (queued, edits.commit().unwrap())
    }

    #[test]
    fn stock_main_is_rewritten() {
        let mut store = MemoryStore::with_documents([(MAIN_TS, STOCK_MAIN)]).unwrap();

        let result = patch_main(&mut store).unwrap();
        assert_eq!(
            result,
            StepResult::Applied {
                path: MAIN_TS.into()
            }
        );
        assert_eq!(store.read_to_string(MAIN_TS).unwrap(), PATCHED_MAIN);
    }

    #[test]
    fn rewritten_main_is_already_applied() {
        let mut store = MemoryStore::with_documents([(MAIN_TS, PATCHED_MAIN)]).unwrap();
        assert!(matches!(
            patch_main(&mut store).unwrap(),
            StepResult::AlreadyApplied { .. }
        ));
        assert_eq!(store.read_to_string(MAIN_TS).unwrap(), PATCHED_MAIN);
    }

    #[test]
    fn custom_root_module_is_kept() {
        let source = "\
import { platformBrowserDynamic } from '@angular/platform-browser-dynamic';
import { environment } from './environments/environment';
import { ShopModule } from './shop/shop.module';

platformBrowserDynamic().bootstrapModule(ShopModule);
";
        let mut store = MemoryStore::with_documents([(MAIN_TS, source)]).unwrap();
        patch_main(&mut store).unwrap();

        let patched = store.read_to_string(MAIN_TS).unwrap();
        assert!(patched.contains("bootstrapModule(ShopModule);\n\nif (environment.hmr)"));
        assert!(!patched.contains("AppModule"));
    }

    #[test]
    fn imports_in_a_bare_main_are_set_apart() {
        let source = "platformBrowserDynamic().bootstrapModule(AppModule);\n";
        let mut store = MemoryStore::with_documents([(MAIN_TS, source)]).unwrap();
        patch_main(&mut store).unwrap();

        let patched = store.read_to_string(MAIN_TS).unwrap();
        assert!(patched.starts_with(
            "import { hmrBootstrap } from './hmr';\n\
             import { environment } from './environments/environment';\n\
             \n\
             const bootstrap = () => platformBrowserDynamic().bootstrapModule(AppModule);\n"
        ));
    }

    #[test]
    fn several_bootstrap_calls_are_skipped() {
        let source = "\
platformBrowserDynamic().bootstrapModule(AppModule);
platformBrowserDynamic().bootstrapModule(AdminModule);
";
        let mut store = MemoryStore::with_documents([(MAIN_TS, source)]).unwrap();
        assert!(matches!(
            patch_main(&mut store).unwrap(),
            StepResult::Skipped { reason } if reason.starts_with("2 bootstrapModule")
        ));
        assert_eq!(store.read_to_string(MAIN_TS).unwrap(), source);
    }

    #[test]
    fn main_without_bootstrap_is_skipped() {
        let source = "console.log('hello');\n";
        let mut store = MemoryStore::with_documents([(MAIN_TS, source)]).unwrap();
        assert!(matches!(
            patch_main(&mut store).unwrap(),
            StepResult::Skipped { .. }
        ));
        assert_eq!(store.read_to_string(MAIN_TS).unwrap(), source);
    }

    #[test]
    fn import_merges_into_existing_named_import() {
        let (queued, out) = imports_after(
            "import { other } from './hmr';\nrun();\n",
            "hmrBootstrap",
            "./hmr",
        );
        assert!(queued);
        assert_eq!(out, "import { other, hmrBootstrap } from './hmr';\nrun();\n");
    }

    #[test]
    fn bound_symbol_is_not_imported_again() {
        let source = "import { hmrBootstrap } from \"./hmr\";\n";
        let (queued, out) = imports_after(source, "hmrBootstrap", "./hmr");
        assert!(!queued);
        assert_eq!(out, source);
    }

    #[test]
    fn file_without_imports_gets_one_at_the_top() {
        let (queued, out) = imports_after("run();\n", "hmrBootstrap", "./hmr");
        assert!(queued);
        assert_eq!(out, "import { hmrBootstrap } from './hmr';\nrun();\n");
    }

    #[test]
    fn new_import_follows_the_last_one() {
        let (_, out) = imports_after(
            "import a from 'a';\nimport * as b from 'b';\n\nrun();\n",
            "hmrBootstrap",
            "./hmr",
        );
        assert_eq!(
            out,
            "import a from 'a';\nimport * as b from 'b';\nimport { hmrBootstrap } from './hmr';\n\nrun();\n"
        );
    }
}
