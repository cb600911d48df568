//! Corrida de respaldo de punta a punta contra un runner guionado: YAML de
//! configuración real, pipeline por carpeta, zip consolidado y limpieza.

use std::io::Write;

use vps_remote::testing::ScriptedRunner;
use vpsflow::backup::BackupOrchestrator;
use vpsflow::config::AppConfig;

fn config_for(dir: &std::path::Path, key: &std::path::Path) -> AppConfig {
    let yaml = format!(
        r#"
vps:
  ip: "203.0.113.7"
  user: "deploy"
  key_path: "{key}"
backup:
  local_save_path: "{save}"
  remote_folders:
    - "/var/www/app"
    - "/etc/nginx"
"#,
        key = key.display(),
        save = dir.display(),
    );
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    let config = AppConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn corrida_de_carpetas_descarga_y_consolida_en_zip() {
    let dir = tempfile::tempdir().unwrap();
    let key = tempfile::NamedTempFile::new().unwrap();
    let config = config_for(dir.path(), key.path());

    let runner = ScriptedRunner::new();
    for _ in 0..2 {
        runner.push_ok(""); // tar
        runner.push_ok("-rw-r--r--"); // ls -la
        runner.push_ok("2048"); // stat
    }

    let orchestrator = BackupOrchestrator::new(&runner, &config);
    let run = orchestrator.run_directories_only().unwrap();

    assert!(run.succeeded());
    assert_eq!(run.archives.len(), 2);
    let bundle = run.bundle.expect("debe existir el zip consolidado");
    assert!(bundle.exists());
    assert!(bundle
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("backup_completo_"));

    // Los tar.gz parciales ya no existen: quedaron dentro del zip.
    let remaining: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].ends_with(".zip"));

    // Un pipeline completo por carpeta, cada una con su limpieza remota.
    let commands = runner.commands();
    assert_eq!(commands.len(), 10);
    assert!(commands[0].contains("-C /var/www app"));
    assert!(commands[5].contains("-C /etc nginx"));
}

#[test]
fn fallo_en_una_carpeta_no_impide_el_resto() {
    let dir = tempfile::tempdir().unwrap();
    let key = tempfile::NamedTempFile::new().unwrap();
    let config = config_for(dir.path(), key.path());

    let runner = ScriptedRunner::new();
    runner.push_failure("tar: No such file or directory"); // carpeta 1
    runner.push_ok(""); // carpeta 2: tar
    runner.push_ok("-rw-"); // ls
    runner.push_ok("512"); // stat

    let orchestrator = BackupOrchestrator::new(&runner, &config);
    let run = orchestrator.run_directories_only().unwrap();

    assert_eq!(run.failures.len(), 1);
    assert!(run.failures[0].contains("/var/www/app"));
    assert_eq!(run.archives.len(), 1);
    assert!(run.bundle.is_some());
}
