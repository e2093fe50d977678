//! A small interactive shell driving a [`simplefs::Filesystem`] over a disk-image file.
//!
//! This exists purely as a demonstration and manual-testing harness: it dispatches a line of
//! input to one of the library's operations and prints the numeric result, the way a human
//! would drive the filesystem from a terminal.

use simplefs::{FileDevice, Filesystem};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;

/// Command line arguments: just the path to the disk image and its size when creating one.
struct Args {
	prog: String,
	image: Option<PathBuf>,
	create_blocks: Option<u32>,
}

fn parse_args() -> Args {
	let mut args = Args {
		prog: String::from("simplefs-shell"),
		image: None,
		create_blocks: None,
	};

	let mut iter = env::args();
	if let Some(prog) = iter.next() {
		args.prog = prog;
	}

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"-h" | "--help" => {
				print_usage(&args.prog);
				exit(0);
			}
			"-n" | "--new" => {
				let n = iter
					.next()
					.and_then(|s| s.parse::<u32>().ok())
					.unwrap_or_else(|| {
						eprintln!("{}: --new requires a block count", args.prog);
						exit(1);
					});
				args.create_blocks = Some(n);
			}
			_ => args.image = Some(arg.into()),
		}
	}

	args
}

fn print_usage(prog: &str) {
	println!();
	println!("Usage:");
	println!(" {prog} [options] <image>");
	println!();
	println!("Opens (or creates) a disk image and drops into an interactive shell.");
	println!();
	println!("Options:");
	println!(" -h, --help\t\tPrints help.");
	println!(" -n, --new <blocks>\tCreates a new zeroed image of the given size.");
}

fn print_help() {
	println!("commands:");
	println!("    format                     write a fresh superblock, erasing all inodes");
	println!("    mount                      bring the volume online");
	println!("    unmount                    take the volume offline");
	println!("    debug                      dump the superblock and every valid inode");
	println!("    create                     allocate a new, empty inode");
	println!("    delete <inumber>           free an inode and its blocks");
	println!("    getsize <inumber>          print an inode's size in bytes");
	println!("    read <inumber> <length> <offset>   print bytes read, as text");
	println!("    write <inumber> <offset> <text>     write text at an offset");
	println!("    help                       print this message");
	println!("    quit                       exit the shell");
}

fn main() {
	let args = parse_args();

	let Some(image) = args.image else {
		eprintln!("{}: specify a disk image", args.prog);
		print_usage(&args.prog);
		exit(1);
	};

	let device = match args.create_blocks {
		Some(blocks) => FileDevice::create(&image, blocks),
		None => FileDevice::open(&image),
	};
	let device = match device {
		Ok(d) => d,
		Err(e) => {
			eprintln!("{}: {}: {}", args.prog, image.display(), e);
			exit(1);
		}
	};

	let mut fs = Filesystem::new(device);
	run_shell(&mut fs);
}

fn run_shell(fs: &mut Filesystem<FileDevice>) {
	let stdin = io::stdin();
	loop {
		print!("simplefs> ");
		let _ = io::stdout().flush();

		let mut line = String::new();
		if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
			break;
		}
		let words: Vec<&str> = line.split_whitespace().collect();
		let Some(&cmd) = words.first() else {
			continue;
		};

		match cmd {
			"format" => report("format", fs.format()),
			"mount" => report("mount", fs.mount()),
			"unmount" => report("unmount", fs.unmount()),
			"debug" => print!("{}", fs.debug()),
			"create" => {
				let inumber = fs.create();
				if inumber > 0 {
					println!("created inode {inumber}");
				} else {
					println!("create failed");
				}
			}
			"delete" => match words.get(1).and_then(|s| s.parse::<i32>().ok()) {
				Some(inumber) => report("delete", fs.delete(inumber)),
				None => println!("usage: delete <inumber>"),
			},
			"getsize" => match words.get(1).and_then(|s| s.parse::<i32>().ok()) {
				Some(inumber) => println!("{}", fs.getsize(inumber)),
				None => println!("usage: getsize <inumber>"),
			},
			"read" => match (
				words.get(1).and_then(|s| s.parse::<i32>().ok()),
				words.get(2).and_then(|s| s.parse::<i32>().ok()),
				words.get(3).and_then(|s| s.parse::<i32>().ok()),
			) {
				(Some(inumber), Some(length), Some(offset)) => {
					let mut buf = vec![0u8; length.max(0) as usize];
					let n = fs.read(inumber, &mut buf, length, offset);
					let text = String::from_utf8_lossy(&buf[..n.max(0) as usize]);
					println!("read {n} bytes: {text}");
				}
				_ => println!("usage: read <inumber> <length> <offset>"),
			},
			"write" => match (
				words.get(1).and_then(|s| s.parse::<i32>().ok()),
				words.get(2).and_then(|s| s.parse::<i32>().ok()),
			) {
				(Some(inumber), Some(offset)) => {
					let text = line
						.splitn(4, char::is_whitespace)
						.nth(3)
						.unwrap_or("")
						.trim_end_matches(['\n', '\r']);
					let data = text.as_bytes();
					let n = fs.write(inumber, data, data.len() as i32, offset);
					println!("wrote {n} bytes");
				}
				_ => println!("usage: write <inumber> <offset> <text>"),
			},
			"help" => print_help(),
			"quit" | "exit" => break,
			other => println!("unknown command: {other} (try 'help')"),
		}
	}
}

fn report(op: &str, result: i32) {
	if result == 1 {
		println!("{op} ok");
	} else {
		println!("{op} failed");
	}
}
