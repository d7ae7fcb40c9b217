//! Connection pool construction.

use crate::config::Configuration;
use crate::error::{WrapError, WrapResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a pool sized to `max_connection` from a [`Configuration`].
///
/// Uses `NoTls`. Connections are opened lazily on first checkout.
pub fn create_pool(configuration: &Configuration) -> WrapResult<Pool> {
    create_pool_with_tls(configuration, NoTls)
}

/// Create a pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(configuration: &Configuration, tls: T) -> WrapResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let max_size = configuration.max_connection;
    create_pool_with_manager_config(configuration, tls, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a pool with an injected `ManagerConfig` and `PoolBuilder` tweaks.
pub fn create_pool_with_manager_config<T>(
    configuration: &Configuration,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> WrapResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config = pg_config(configuration)?;
    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| WrapError::Pool(e.to_string()))
}

/// Translate a [`Configuration`] into driver connection settings.
pub fn pg_config(configuration: &Configuration) -> WrapResult<tokio_postgres::Config> {
    if configuration.host.is_empty() {
        return Err(WrapError::Connection("host is required".to_string()));
    }
    if configuration.database.is_empty() {
        return Err(WrapError::Connection("database is required".to_string()));
    }
    if configuration.username.is_empty() {
        return Err(WrapError::Connection("username is required".to_string()));
    }

    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .dbname(configuration.database.as_str())
        .host(configuration.host.as_str())
        .port(configuration.port)
        .user(configuration.username.as_str())
        .password(configuration.password.as_str())
        .application_name("pgwrap");
    Ok(pg_config)
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pg_config_carries_settings() {
        let configuration = Configuration::new("app", "db.internal", 6543, "svc", "pw");
        let pg = pg_config(&configuration).unwrap();
        assert_eq!(pg.get_dbname(), Some("app"));
        assert_eq!(pg.get_user(), Some("svc"));
        assert_eq!(pg.get_ports(), &[6543]);
        assert_eq!(pg.get_password(), Some(&b"pw"[..]));
    }

    #[test]
    fn pg_config_requires_host() {
        let configuration = Configuration::new("app", "", 5432, "svc", "pw");
        assert!(matches!(
            pg_config(&configuration),
            Err(WrapError::Connection(_))
        ));
    }

    #[test]
    fn pool_is_sized_from_configuration() {
        let configuration =
            Configuration::new("app", "localhost", 5432, "svc", "pw").max_connection(3);
        let pool = create_pool(&configuration).unwrap();
        assert_eq!(pool.status().max_size, 3);
        assert_eq!(pool.status().size, 0);
    }
}
