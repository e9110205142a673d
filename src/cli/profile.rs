use std::io;

use bazaar::{catalog::Catalog, chain::Address, render};
use clap::Args;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct ProfileArgs {
    /// Wallet address of the user
    address: String,

    /// Account viewing the profile; purchases are only listed on its own profile
    #[arg(long = "account", env = "BAZAAR_ACCOUNT")]
    viewer: Option<String>,
}

pub(crate) fn run(catalog: &Catalog, args: &ProfileArgs) -> Result<(), CliError> {
    let address = Address::new(args.address.as_str());
    let viewer = args.viewer.as_deref().map(Address::new);
    let user = catalog.profile(&address);

    let listed = catalog.products_by_seller(address.as_str());
    let orders = catalog.purchases_visible_to(&address, viewer.as_ref());

    render::write_profile(
        &mut io::stdout().lock(),
        &user,
        &listed,
        orders.as_deref(),
    )?;

    Ok(())
}
