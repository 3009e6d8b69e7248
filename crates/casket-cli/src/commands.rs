use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::sync::Arc;

use colored::Colorize;

use casket_block::{Block, BlockKind};
use casket_server::BlockServer;
use casket_store::{BlockStore, FsBlockStore};
use casket_stream::{StreamReader, StreamWriter};
use casket_types::Address;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Put(args) => cmd_put(args),
        Command::Get(args) => cmd_get(args),
        Command::Verify(args) => cmd_verify(args),
        Command::Serve(args) => cmd_serve(args),
    }
}

fn open_store(args: &StoreArgs) -> anyhow::Result<Arc<FsBlockStore>> {
    Ok(Arc::new(FsBlockStore::open(&args.store, args.geometry())?))
}

fn cmd_put(args: PutArgs) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let mut writer = StreamWriter::new(store);

    let file = File::open(&args.file)?;
    let receipt = writer.write(io::BufReader::new(file))?;
    writer.close()?;

    println!("{}", receipt.root);
    eprintln!(
        "{} {} bytes as {} data / {} indirect blocks",
        "stored".green(),
        receipt.bytes_written,
        receipt.data_blocks,
        receipt.indirect_blocks
    );
    Ok(())
}

fn cmd_get(args: GetArgs) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let root = Address::from_hex(&args.address)?;
    let mut reader = StreamReader::new(store, root)?;

    let bytes = match &args.output {
        Some(path) => {
            let mut out = io::BufWriter::new(File::create(path)?);
            reader.read(&mut out)?
        }
        None => reader.read(io::stdout().lock())?,
    };
    reader.close()?;

    eprintln!("{} {bytes} bytes", "restored".green());
    Ok(())
}

/// Walk the tree from the root, re-hash every block, and check that each
/// block's bytes still digest to the address it is stored under.
fn cmd_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let geometry = *store.geometry();
    let root = Address::from_hex(&args.address)?;
    if root.width() != geometry.addr_width() {
        anyhow::bail!(
            "address width {} does not match store geometry width {}",
            root.width(),
            geometry.addr_width()
        );
    }

    let mut queue = VecDeque::from([root]);
    let mut data_blocks = 0u64;
    let mut indirect_blocks = 0u64;
    let mut payload_bytes = 0u64;

    while let Some(address) = queue.pop_front() {
        let bytes = store.get(&address)?;
        let actual = geometry.digest.address_of(&[&bytes]);
        if actual != address {
            anyhow::bail!("block {address} hashes to {actual}: store is corrupt");
        }
        let block = Block::parse(&bytes, &geometry)?;
        match block.kind() {
            BlockKind::Data => {
                data_blocks += 1;
                payload_bytes += block.payload_len() as u64;
            }
            BlockKind::Indirect => {
                indirect_blocks += 1;
                queue.extend(block.child_addresses(&geometry)?);
            }
        }
    }

    println!(
        "{} {} data / {} indirect blocks, {} payload bytes",
        "ok".green().bold(),
        data_blocks,
        indirect_blocks,
        payload_bytes
    );
    Ok(())
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let server = BlockServer::bind(&args.bind, store)?;
    println!(
        "casket block server on {}",
        server.local_addr()?.to_string().bold()
    );
    server.serve()?;
    Ok(())
}
