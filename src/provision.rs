//! Provisioning command builders: typed configuration records in, parallel
//! (command, description) sequences out.
//!
//! The console never interprets command content; it only runs these in order.

use crate::detect::{HostOs, Tool};
use crate::errors::ProvisionError;
use crate::queue::QueuedCommand;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageManager {
    Apt,
    Dnf,
}

fn package_manager(os: &HostOs) -> Result<PackageManager, ProvisionError> {
    match os {
        HostOs::Debian | HostOs::Ubuntu => Ok(PackageManager::Apt),
        HostOs::Fedora => Ok(PackageManager::Dnf),
        HostOs::Other(name) => Err(ProvisionError::UnsupportedOs(name.clone())),
    }
}

impl PackageManager {
    fn refresh(&self) -> &'static str {
        match self {
            PackageManager::Apt => "DEBIAN_FRONTEND=noninteractive apt-get update -q",
            PackageManager::Dnf => "dnf makecache -q",
        }
    }

    fn install(&self, packages: &str) -> String {
        match self {
            PackageManager::Apt => format!(
                "DEBIAN_FRONTEND=noninteractive apt-get install -y -q {}",
                packages
            ),
            PackageManager::Dnf => format!("dnf install -y -q {}", packages),
        }
    }
}

fn packages_for(tool: Tool, pm: PackageManager) -> &'static str {
    match (tool, pm) {
        (Tool::Caddy, _) => "caddy",
        (Tool::Php, PackageManager::Apt) => "php-fpm php-cli php-mysql php-xml php-curl php-mbstring",
        (Tool::Php, PackageManager::Dnf) => "php-fpm php-cli php-mysqlnd php-xml php-mbstring",
        (Tool::Composer, _) => "composer",
        (Tool::Mysql, PackageManager::Apt) => "mysql-server",
        (Tool::Mysql, PackageManager::Dnf) => "community-mysql-server",
        (Tool::Node, PackageManager::Apt) => "nodejs npm",
        (Tool::Node, PackageManager::Dnf) => "nodejs npm",
        (Tool::Redis, PackageManager::Apt) => "redis-server",
        (Tool::Redis, PackageManager::Dnf) => "redis",
        (Tool::Supervisor, _) => "supervisor",
        (Tool::Ufw, _) => "ufw",
    }
}

/// Unit to enable right after installing, where the tool ships one.
fn unit_for(tool: Tool, pm: PackageManager) -> Option<&'static str> {
    match (tool, pm) {
        (Tool::Caddy, _) => Some("caddy"),
        (Tool::Php, _) => Some("php-fpm"),
        (Tool::Mysql, PackageManager::Apt) => Some("mysql"),
        (Tool::Mysql, PackageManager::Dnf) => Some("mysqld"),
        (Tool::Redis, PackageManager::Apt) => Some("redis-server"),
        (Tool::Redis, PackageManager::Dnf) => Some("redis"),
        (Tool::Supervisor, _) => Some("supervisor"),
        _ => None,
    }
}

pub fn tool_install(os: &HostOs, tool: Tool) -> Result<Vec<QueuedCommand>, ProvisionError> {
    let pm = package_manager(os)?;
    let mut steps = vec![
        QueuedCommand::new(pm.refresh(), "Refresh package index"),
        QueuedCommand::new(
            pm.install(packages_for(tool, pm)),
            format!("Install {}", tool.display()),
        ),
    ];
    if let Some(unit) = unit_for(tool, pm) {
        steps.push(QueuedCommand::new(
            format!("systemctl enable --now {}", unit),
            format!("Enable and start {}", unit),
        ));
    }
    Ok(steps)
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub domain: String,
    /// Empty means "start a fresh project" rather than cloning.
    pub git_repo: Option<String>,
    pub branch: String,
}

pub fn create_site(os: &HostOs, cfg: &SiteConfig) -> Result<Vec<QueuedCommand>, ProvisionError> {
    package_manager(os)?;
    if cfg.name.is_empty() {
        return Err(ProvisionError::InvalidConfig("site name is required".into()));
    }
    if cfg.domain.is_empty() {
        return Err(ProvisionError::InvalidConfig("domain is required".into()));
    }

    let root = format!("/var/www/{}", cfg.name);
    let mut steps = Vec::new();

    match &cfg.git_repo {
        Some(repo) if !repo.is_empty() => {
            steps.push(QueuedCommand::new(
                format!("git clone --branch {} {} {}", cfg.branch, repo, root),
                format!("Clone repository into {}", root),
            ));
            steps.push(QueuedCommand::new(
                format!("cd {} && composer install --no-interaction --no-dev", root),
                "Install Composer dependencies",
            ));
        }
        _ => {
            steps.push(QueuedCommand::new(
                format!(
                    "composer create-project --no-interaction laravel/laravel {}",
                    root
                ),
                format!("Create Laravel project in {}", root),
            ));
        }
    }

    steps.push(QueuedCommand::new(
        format!("cd {} && cp -n .env.example .env && php artisan key:generate", root),
        "Generate application key",
    ));
    steps.push(QueuedCommand::new(
        format!("chown -R www-data:www-data {}", root),
        "Fix ownership",
    ));
    steps.push(QueuedCommand::new(
        caddy_site_command(&cfg.domain, &root),
        format!("Write Caddy config for {}", cfg.domain),
    ));
    steps.push(QueuedCommand::new(
        "systemctl reload caddy",
        "Reload Caddy",
    ));

    Ok(steps)
}

fn caddy_site_command(domain: &str, root: &str) -> String {
    format!(
        "mkdir -p /etc/caddy/sites && printf '%s {{\\n    root * {}/public\\n    php_fastcgi unix//run/php/php-fpm.sock\\n    file_server\\n}}\\n' '{}' > /etc/caddy/sites/{}.caddy",
        root, domain, domain
    )
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
}

pub fn create_database(
    os: &HostOs,
    cfg: &DatabaseConfig,
) -> Result<Vec<QueuedCommand>, ProvisionError> {
    package_manager(os)?;
    if cfg.name.is_empty() || cfg.user.is_empty() {
        return Err(ProvisionError::InvalidConfig(
            "database name and user are required".into(),
        ));
    }
    Ok(vec![
        QueuedCommand::new(
            format!(
                "mysql -e \"CREATE DATABASE IF NOT EXISTS {} CHARACTER SET utf8mb4\"",
                cfg.name
            ),
            format!("Create database {}", cfg.name),
        ),
        QueuedCommand::new(
            format!(
                "mysql -e \"CREATE USER IF NOT EXISTS '{}'@'localhost' IDENTIFIED BY '{}'\"",
                cfg.user, cfg.password
            ),
            format!("Create user {}", cfg.user),
        ),
        QueuedCommand::new(
            format!(
                "mysql -e \"GRANT ALL PRIVILEGES ON {}.* TO '{}'@'localhost'; FLUSH PRIVILEGES\"",
                cfg.name, cfg.user
            ),
            "Grant privileges",
        ),
    ])
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub site: String,
    pub connection: String,
    pub processes: u32,
}

pub fn queue_workers(os: &HostOs, cfg: &WorkerConfig) -> Result<Vec<QueuedCommand>, ProvisionError> {
    package_manager(os)?;
    if cfg.site.is_empty() {
        return Err(ProvisionError::InvalidConfig("site name is required".into()));
    }
    if cfg.processes == 0 {
        return Err(ProvisionError::InvalidConfig(
            "at least one worker process is required".into(),
        ));
    }
    let conf = format!("/etc/supervisor/conf.d/deckhand-{}.conf", cfg.site);
    Ok(vec![
        QueuedCommand::new(
            format!(
                "printf '[program:deckhand-{site}]\\ncommand=php /var/www/{site}/artisan queue:work {conn} --sleep=3 --tries=3\\nnumprocs={procs}\\nprocess_name=%%(program_name)s_%%(process_num)02d\\nautostart=true\\nautorestart=true\\nuser=www-data\\n' > {conf}",
                site = cfg.site,
                conn = cfg.connection,
                procs = cfg.processes,
                conf = conf
            ),
            format!("Write Supervisor program for {}", cfg.site),
        ),
        QueuedCommand::new("supervisorctl reread", "Reread Supervisor configs"),
        QueuedCommand::new("supervisorctl update", "Apply Supervisor changes"),
        QueuedCommand::new(
            format!("supervisorctl start 'deckhand-{}:*'", cfg.site),
            format!("Start workers for {}", cfg.site),
        ),
    ])
}

pub fn harden_ssh(os: &HostOs) -> Result<Vec<QueuedCommand>, ProvisionError> {
    let pm = package_manager(os)?;
    let unit = match pm {
        PackageManager::Apt => "ssh",
        PackageManager::Dnf => "sshd",
    };
    Ok(vec![
        QueuedCommand::new(
            "sed -i 's/^#\\?PasswordAuthentication.*/PasswordAuthentication no/' /etc/ssh/sshd_config",
            "Disable SSH password authentication",
        ),
        QueuedCommand::new(
            "sed -i 's/^#\\?PermitRootLogin.*/PermitRootLogin prohibit-password/' /etc/ssh/sshd_config",
            "Restrict root login to keys",
        ),
        QueuedCommand::new(format!("systemctl restart {}", unit), "Restart SSH daemon"),
    ])
}

/// Generates an ed25519 deploy key; the returned path is rendered to the
/// operator after the queue succeeds.
pub fn deploy_key() -> (Vec<QueuedCommand>, PathBuf) {
    let key_path = "/root/.ssh/deckhand_deploy";
    let steps = vec![
        QueuedCommand::new("mkdir -p /root/.ssh && chmod 700 /root/.ssh", "Prepare ~/.ssh"),
        QueuedCommand::new(
            format!(
                "ssh-keygen -t ed25519 -N '' -C deckhand-deploy -f {}",
                key_path
            ),
            "Generate deploy key",
        ),
    ];
    (steps, PathBuf::from(format!("{}.pub", key_path)))
}

pub fn firewall_enable(os: &HostOs) -> Result<Vec<QueuedCommand>, ProvisionError> {
    match package_manager(os)? {
        PackageManager::Apt => Ok(vec![
            QueuedCommand::new("ufw default deny incoming", "Deny inbound by default"),
            QueuedCommand::new("ufw allow OpenSSH", "Keep SSH reachable"),
            QueuedCommand::new("ufw allow 80/tcp", "Allow HTTP"),
            QueuedCommand::new("ufw allow 443/tcp", "Allow HTTPS"),
            QueuedCommand::new("ufw --force enable", "Enable UFW"),
        ]),
        PackageManager::Dnf => Err(ProvisionError::InvalidConfig(
            "UFW provisioning is only supported on apt-based hosts".into(),
        )),
    }
}

pub fn firewall_allow_port(os: &HostOs, port: u16) -> Result<Vec<QueuedCommand>, ProvisionError> {
    match package_manager(os)? {
        PackageManager::Apt => Ok(vec![QueuedCommand::new(
            format!("ufw allow {}/tcp", port),
            format!("Allow TCP port {}", port),
        )]),
        PackageManager::Dnf => Err(ProvisionError::InvalidConfig(
            "UFW provisioning is only supported on apt-based hosts".into(),
        )),
    }
}
