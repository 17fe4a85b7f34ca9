use std::collections::BTreeSet;
use std::time::SystemTime;

use ricebox_format::{embed_package, Package};

use crate::cli::EmbedSysoArgs;
use crate::error::{Error, Result};
use crate::package;
use crate::util::source_date_epoch;

const NO_BOXES_FOUND: &str = "no calls to rice.FindBox() found";

pub fn run(args: EmbedSysoArgs) -> Result<()> {
    let created_at = source_date_epoch()?;
    match embed(args, created_at)? {
        Some(package) => {
            tracing::info!(
                package = %package.name,
                boxes = package.box_names.len(),
                "embedded package"
            );
        }
        None => println!("{}", NO_BOXES_FOUND),
    }
    Ok(())
}

/// Resolve the package and embed its boxes. `None` when there is nothing to embed.
fn embed(args: EmbedSysoArgs, created_at: Option<SystemTime>) -> Result<Option<Package>> {
    let dir = args.package_dir;

    let scan = if args.boxes.is_empty() || args.package_name.is_none() {
        package::scan(&dir)?
    } else {
        package::Scan::default()
    };

    let box_names = if args.boxes.is_empty() {
        scan.box_names
    } else {
        args.boxes.into_iter().collect::<BTreeSet<_>>()
    };
    if box_names.is_empty() {
        return Ok(None);
    }

    let name = match args.package_name.or(scan.name) {
        Some(name) => name,
        None => return Err(Error::MissingPackageName { path: dir }),
    };

    let package = Package {
        dir,
        name,
        box_names,
    };
    embed_package(&package, created_at).map_err(|source| Error::Embed {
        path: package.dir.clone(),
        source,
    })?;

    Ok(Some(package))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(dir: PathBuf) -> EmbedSysoArgs {
        EmbedSysoArgs {
            package_dir: dir,
            boxes: vec![],
            package_name: None,
        }
    }

    #[test]
    fn no_boxes_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("main.go"), "package main\n").unwrap();

        assert!(embed(args(temp_dir.path().to_path_buf()), None)
            .unwrap()
            .is_none());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn embeds_scanned_boxes() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(
            dir.join("main.go"),
            "package webapp\n\nvar box = rice.MustFindBox(\"assets\")\n",
        )
        .unwrap();
        std::fs::create_dir(dir.join("assets")).unwrap();
        std::fs::write(dir.join("assets").join("index.html"), b"<html>").unwrap();

        let package = embed(args(dir.to_path_buf()), Some(SystemTime::UNIX_EPOCH))
            .unwrap()
            .unwrap();
        assert_eq!(package.name, "webapp");
        assert!(dir.join("assets_386.rice-box.syso").is_file());
        assert!(dir.join("assets_amd64.rice-box.syso").is_file());
        let helper = std::fs::read_to_string(dir.join("assets.rice-box.go")).unwrap();
        assert!(helper.contains("\npackage webapp\n"));
    }

    #[test]
    fn explicit_boxes_need_no_sources() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::create_dir(dir.join("static")).unwrap();

        let mut explicit = args(dir.to_path_buf());
        explicit.boxes = vec!["static".to_string()];
        assert!(matches!(
            embed(explicit, None),
            Err(Error::MissingPackageName { .. })
        ));

        let mut explicit = args(dir.to_path_buf());
        explicit.boxes = vec!["static".to_string()];
        explicit.package_name = Some("server".to_string());
        let package = embed(explicit, None).unwrap().unwrap();
        assert_eq!(package.name, "server");
        assert!(dir.join("static.rice-box.go").is_file());
    }

    #[test]
    fn missing_box_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(
            dir.join("main.go"),
            "package main\nvar box = rice.FindBox(\"missing\")\n",
        )
        .unwrap();

        assert!(matches!(
            embed(args(dir.to_path_buf()), None),
            Err(Error::Embed { .. })
        ));
    }
}
