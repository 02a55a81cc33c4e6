use anyhow::Result;

pub mod run;
pub mod show_config;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
