use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REFERENCE_APP: &str = "import Header from './Header';\nimport Footer from './Footer';\n\
import TodoList from './TodoList';\n\nfunction App() {\n  return (\n    <div>\n      <Header />\n      \
<TodoList />\n      <Footer />\n    </div>\n  );\n}\n\nexport default App;\n";

/// Scores 65: App, TodoList and export present
pub const SUBMISSION_APP: &str = "import TodoList from './TodoList';\n\nconst App = () => {\n  \
return <TodoList items={[]} />;\n};\n\nexport default App;\n";

/// Get a Command for gradeflow, isolated from any user configuration
pub fn gradeflow(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("gradeflow");
    cmd.current_dir(dir)
        .env("GRADEFLOW_CONFIG_DIR", dir.join(".no-user-config"))
        .env_remove("GRADEFLOW_CONFIG")
        .env_remove("GRADEFLOW_LOG")
        .env_remove("RUST_LOG");
    cmd
}

pub fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

/// Temp directory with `reference/` and `submission/` trees
pub fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "reference/src/App.jsx", REFERENCE_APP);
    write(dir.path(), "reference/package.json", "{}");
    write(dir.path(), "submission/src/App.jsx", SUBMISSION_APP);
    write(dir.path(), "submission/node_modules/lib/index.js", "module.exports = {};");
    dir
}
