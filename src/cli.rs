//! Interface de linha de comando do hive-rounds baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (create, start,
//! complete, skip, finish, ...) e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use hive_rounds::workflow::FinishOutcome;

/// hive-rounds: rodadas de inspeção de colmeias em lote.
#[derive(Debug, Parser)]
#[command(name = "hive-rounds", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Desfecho aceito pela CLI, mapeado para [`FinishOutcome`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    /// A rodada terminou normalmente.
    Completed,
    /// A rodada foi abandonada.
    Cancelled,
}

impl From<OutcomeArg> for FinishOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Completed => FinishOutcome::Completed,
            OutcomeArg::Cancelled => FinishOutcome::Cancelled,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cria uma sessão em rascunho com as colmeias na ordem dada.
    Create {
        /// Identificador do apiário dono das colmeias.
        #[arg(long)]
        apiary: String,

        /// Nome da rodada.
        #[arg(long)]
        name: String,

        /// Colmeias a visitar, em ordem.
        #[arg(required = true)]
        hives: Vec<String>,
    },

    /// Lista todas as sessões.
    List,

    /// Mostra uma sessão e suas visitas.
    Show { session: Uuid },

    /// Renomeia uma sessão.
    Rename { session: Uuid, name: String },

    /// Redefine a ordem das visitas (somente em rascunho).
    Reorder {
        session: Uuid,

        /// Pares `<entry-id>=<ordem>` cobrindo todas as visitas.
        #[arg(required = true, value_parser = parse_order_pair)]
        orders: Vec<(Uuid, i64)>,
    },

    /// Inicia a sessão.
    Start { session: Uuid },

    /// Conclui a visita atual com o registro de inspeção informado.
    Complete {
        session: Uuid,

        /// Identificador do registro de inspeção produzido.
        #[arg(long)]
        record: String,
    },

    /// Adia a visita atual sem cancelá-la.
    Skip { session: Uuid },

    /// Cancela uma visita pendente.
    CancelVisit { session: Uuid, entry: Uuid },

    /// Encerra a sessão.
    Finish {
        session: Uuid,

        #[arg(long, value_enum)]
        outcome: OutcomeArg,
    },

    /// Mostra o progresso e a estimativa de tempo restante.
    Progress { session: Uuid },
}

fn parse_order_pair(s: &str) -> Result<(Uuid, i64), String> {
    let (entry, order) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <entry-id>=<order>, got `{s}`"))?;
    let entry = entry
        .trim()
        .parse::<Uuid>()
        .map_err(|e| format!("invalid entry id `{entry}`: {e}"))?;
    let order = order
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid order `{order}`: {e}"))?;
    Ok((entry, order))
}
