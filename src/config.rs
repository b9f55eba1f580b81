use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// The project file name, searched for in the starting directory and its
/// ancestors.
pub const PROJECT_FILE: &str = "sitegen.yaml";

#[derive(Deserialize)]
struct Project {
    site_name: String,
    owner: String,

    #[serde(default)]
    pandoc: Option<PathBuf>,

    #[serde(default)]
    production: Profile,

    #[serde(default)]
    test: Option<Profile>,
}

/// The directory layout for one kind of build. Relative paths are resolved
/// against the directory containing the project file.
#[derive(Deserialize)]
#[serde(default)]
struct Profile {
    output_directory: PathBuf,
    pages_directory: PathBuf,
    static_directory: PathBuf,
    posts_directory: PathBuf,
    projects_directory: Option<PathBuf>,
    templates_directory: PathBuf,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            output_directory: PathBuf::from("site"),
            pages_directory: PathBuf::from("site_src"),
            static_directory: PathBuf::from("site_src/static"),
            posts_directory: PathBuf::from("posts"),
            projects_directory: Some(PathBuf::from("projects")),
            templates_directory: PathBuf::from("templates"),
        }
    }
}

/// Selects between the production and test layouts of a project.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BuildKind {
    Production,
    Test,
}

/// Everything a build needs to know, resolved to concrete paths. A [`Config`]
/// is built once and passed by reference into every stage.
#[derive(Clone, Debug)]
pub struct Config {
    /// Appended to page titles as `{title} - {site_name}`.
    pub site_name: String,

    /// The title of the `index` page.
    pub owner: String,

    /// The external converter for markup formats without built-in support.
    pub pandoc: Option<PathBuf>,

    /// The build output root. Deleted and recreated on every build.
    pub output_directory: PathBuf,

    /// Top-level page templates (`*.html`).
    pub pages_directory: PathBuf,

    /// Global static assets, copied to `{output_directory}/static`.
    pub static_directory: PathBuf,

    pub posts_source_directory: PathBuf,
    pub posts_output_directory: PathBuf,

    /// `None` disables the projects section.
    pub projects_source_directory: Option<PathBuf>,
    pub projects_output_directory: PathBuf,

    pub templates_directory: PathBuf,
}

impl Config {
    /// Finds the project file in `dir` or the nearest ancestor that has one
    /// and loads it.
    pub fn from_directory(dir: &Path, kind: BuildKind) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, kind)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(dir) => Config::from_directory(dir, kind),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, kind: BuildKind) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Config::from_project(project, project_root, kind),
        }
    }

    fn from_project(project: Project, root: &Path, kind: BuildKind) -> Result<Config> {
        let profile = match kind {
            BuildKind::Production => project.production,
            BuildKind::Test => project
                .test
                .ok_or_else(|| anyhow!("No `test` profile in `{}`", PROJECT_FILE))?,
        };
        let output_directory = root.join(&profile.output_directory);
        let config = Config {
            site_name: project.site_name,
            owner: project.owner,
            pandoc: project.pandoc,
            posts_output_directory: output_directory.join("posts"),
            projects_output_directory: output_directory.join("projects"),
            output_directory,
            pages_directory: root.join(profile.pages_directory),
            static_directory: root.join(profile.static_directory),
            posts_source_directory: root.join(profile.posts_directory),
            projects_source_directory: profile.projects_directory.map(|p| root.join(p)),
            templates_directory: root.join(profile.templates_directory),
        };
        config.check_output_directory(root)?;
        Ok(config)
    }

    /// Every build starts by deleting the output directory, so it must not
    /// contain the project root or any source directory.
    fn check_output_directory(&self, root: &Path) -> Result<()> {
        let output = normalize(&self.output_directory);
        let mut protected: Vec<&Path> = vec![
            root,
            self.pages_directory.as_path(),
            self.static_directory.as_path(),
            self.posts_source_directory.as_path(),
            self.templates_directory.as_path(),
        ];
        if let Some(projects) = &self.projects_source_directory {
            protected.push(projects.as_path());
        }
        for dir in protected {
            if normalize(dir).starts_with(&output) {
                return Err(anyhow!(
                    "output_directory `{}` would delete `{}` when cleaned",
                    self.output_directory.display(),
                    dir.display()
                ));
            }
        }
        Ok(())
    }
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            _ => normalized.push(component),
        }
    }
    normalized
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str = "
site_name: Example Site
owner: Ada Lovelace
test:
  output_directory: tests/site
  posts_directory: tests/posts
  projects_directory: null
";

    #[test]
    fn test_production_defaults() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::write(tmp.path().join(PROJECT_FILE), PROJECT)?;

        let config = Config::from_directory(tmp.path(), BuildKind::Production)?;

        assert_eq!("Example Site", config.site_name);
        assert_eq!("Ada Lovelace", config.owner);
        assert_eq!(None, config.pandoc);
        assert_eq!(tmp.path().join("site"), config.output_directory);
        assert_eq!(tmp.path().join("site/posts"), config.posts_output_directory);
        assert_eq!(tmp.path().join("site_src/static"), config.static_directory);
        assert_eq!(Some(tmp.path().join("projects")), config.projects_source_directory);
        Ok(())
    }

    #[test]
    fn test_test_profile() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::write(tmp.path().join(PROJECT_FILE), PROJECT)?;

        let config = Config::from_directory(tmp.path(), BuildKind::Test)?;

        assert_eq!(tmp.path().join("tests/site"), config.output_directory);
        assert_eq!(tmp.path().join("tests/posts"), config.posts_source_directory);
        assert_eq!(tmp.path().join("templates"), config.templates_directory);
        assert_eq!(None, config.projects_source_directory);
        Ok(())
    }

    #[test]
    fn test_missing_test_profile() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::write(
            tmp.path().join(PROJECT_FILE),
            "site_name: Example Site\nowner: Ada Lovelace\n",
        )?;
        assert!(Config::from_directory(tmp.path(), BuildKind::Test).is_err());
        Ok(())
    }

    #[test]
    fn test_output_directory_must_not_contain_sources() -> Result<()> {
        for output in &[".", "..", "posts/..", "./", "site_src", "templates"] {
            let tmp = TempDir::new()?;
            fs::write(
                tmp.path().join(PROJECT_FILE),
                format!(
                    "site_name: Example Site\nowner: Ada Lovelace\nproduction:\n  output_directory: {:?}\n",
                    output
                ),
            )?;
            match Config::from_directory(tmp.path(), BuildKind::Production) {
                Ok(config) => panic!(
                    "output_directory {:?} accepted as {}",
                    output,
                    config.output_directory.display()
                ),
                Err(err) => assert!(
                    format!("{:#}", err).contains("would delete"),
                    "{}: {:#}",
                    output,
                    err
                ),
            }
            assert!(tmp.path().join(PROJECT_FILE).is_file());
        }
        Ok(())
    }

    #[test]
    fn test_output_directory_inside_sources_is_allowed() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::write(
            tmp.path().join(PROJECT_FILE),
            "site_name: Example Site\nowner: Ada Lovelace\nproduction:\n  output_directory: build/site\n",
        )?;

        let config = Config::from_directory(tmp.path(), BuildKind::Production)?;

        assert_eq!(tmp.path().join("build/site"), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_searches_parent_directories() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::write(tmp.path().join(PROJECT_FILE), PROJECT)?;
        let nested = tmp.path().join("posts/hello");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, BuildKind::Production)?;

        assert_eq!(tmp.path().join("site"), config.output_directory);
        Ok(())
    }
}
