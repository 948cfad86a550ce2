//! User commands - create, update, delete and get

use clap::Args;

use crate::domain::{DomainError, User};
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// User name: 8-64 lowercase letters and digits
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// User ID
    #[arg(allow_negative_numbers = true)]
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// New notes; pass an empty string to clear them
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// User ID
    #[arg(allow_negative_numbers = true)]
    pub id: i64,
}

impl From<CreateArgs> for CreateUserRequest {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            notes: args.notes,
        }
    }
}

impl From<UpdateArgs> for UpdateUserRequest {
    fn from(args: UpdateArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            notes: args.notes,
        }
    }
}

pub async fn create(args: CreateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = crate::create_user_service(&config).await?;

    let user = service.create(args.into()).await.map_err(report)?;
    print_user(&user)
}

pub async fn update(args: UpdateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = crate::create_user_service(&config).await?;

    let id = args.id;
    let request = UpdateUserRequest::from(args);
    if request.is_empty() {
        anyhow::bail!("Nothing to update, pass at least one of --name, --email or --notes");
    }

    let user = service.update(id, request).await.map_err(report)?;
    print_user(&user)
}

pub async fn delete(args: IdArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = crate::create_user_service(&config).await?;

    if service.delete(args.id).await.map_err(report)? {
        println!("Deleted user {}", args.id);
    } else {
        println!("User {} was already deleted", args.id);
    }

    Ok(())
}

pub async fn get(args: IdArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = crate::create_user_service(&config).await?;

    match service.get_by_id(args.id).await.map_err(report)? {
        Some(user) => print_user(&user),
        None => Err(DomainError::not_found(format!("User not found [id={}]", args.id)).into()),
    }
}

fn print_user(user: &User) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}

/// Print each violation as `field: message` before handing the error back
fn report(error: DomainError) -> anyhow::Error {
    for violation in error.violations() {
        eprintln!("{}", violation);
    }

    error.into()
}
