//! Line-oriented text format for trained networks.
//!
//! ```text
//! # MLP Network File v1
//! # Format: Architecture | Activations | Weights
//!
//! ARCHITECTURE: 2 2 1
//! ACTIVATIONS: 0 0
//! WEIGHTS:
//! LAYER 0:
//! BIASES: 0.0000000000 0.0000000000
//! NEURON 0: 0.0000000000 0.0000000000
//! NEURON 1: 0.0000000000 0.0000000000
//! LAYER 1:
//! ...
//! ```
//!
//! Values are written with 10 decimals. `BIASES:` lines are optional on load;
//! a file that stops after `ACTIVATIONS:` yields a freshly initialised network.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use log::{debug, warn};

use crate::activation::activation::ActivationType;
use crate::error::PersistenceError;
use crate::network::network::Network;

pub const FILE_VERSION: u32 = 1;

/// Largest network (weights plus biases, input layer included) a file may
/// declare. Anything bigger is rejected before allocation.
pub const MAX_PARAMETERS: usize = 1 << 27;

const ARCHITECTURE: &str = "ARCHITECTURE:";
const ACTIVATIONS: &str = "ACTIVATIONS:";
const WEIGHTS: &str = "WEIGHTS:";
const LAYER: &str = "LAYER ";
const NEURON: &str = "NEURON ";
const BIASES: &str = "BIASES:";

type Result<T> = std::result::Result<T, PersistenceError>;

/// Writes `network` to `path`, replacing any existing file.
pub fn save_network(network: &Network, path: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_network(network, &mut writer)?;
    writer.flush()?;
    debug!("saved network {:?} to {path}", network.architecture());
    Ok(())
}

/// Reads a network from `path`.
pub fn load_network(path: &str) -> Result<Network> {
    let network = read_network(BufReader::new(File::open(path)?))?;
    debug!("loaded network {:?} from {path}", network.architecture());
    Ok(network)
}

pub fn encode_network(network: &Network) -> Result<String> {
    let mut buf = Vec::new();
    write_network(network, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn decode_network(text: &str) -> Result<Network> {
    read_network(text.as_bytes())
}

pub fn write_network<W: Write>(network: &Network, mut w: W) -> Result<()> {
    writeln!(w, "# MLP Network File v{FILE_VERSION}")?;
    writeln!(w, "# Format: Architecture | Activations | Weights")?;
    writeln!(w)?;

    writeln!(w, "{ARCHITECTURE} {}", join(network.architecture().iter().map(|n| n.to_string())))?;
    writeln!(w, "{ACTIVATIONS} {}", join(network.activation_types().iter().map(|a| a.code().to_string())))?;

    writeln!(w, "{WEIGHTS}")?;
    for (l, layer) in network.layers().iter().enumerate() {
        writeln!(w, "{LAYER}{l}:")?;
        writeln!(w, "{BIASES} {}", join(layer.neurons().iter().map(|n| fixed(n.bias()))))?;
        for (j, neuron) in layer.neurons().iter().enumerate() {
            writeln!(w, "{NEURON}{j}: {}", join(neuron.weights().iter().map(|x| fixed(*x))))?;
        }
    }
    Ok(())
}

pub fn read_network<R: BufRead>(reader: R) -> Result<Network> {
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((idx + 1, trimmed.to_string()));
    }
    let mut lines = lines.into_iter();

    let (line_no, line) = lines.next().ok_or(PersistenceError::MissingSection("ARCHITECTURE"))?;
    let architecture: Vec<usize> = match line.strip_prefix(ARCHITECTURE) {
        Some(rest) => parse_tokens(rest, line_no, "layer size")?,
        None => return Err(PersistenceError::MissingSection("ARCHITECTURE")),
    };
    check_parameter_count(&architecture, line_no)?;

    let (line_no, line) = lines.next().ok_or(PersistenceError::MissingSection("ACTIVATIONS"))?;
    let activations: Vec<ActivationType> = match line.strip_prefix(ACTIVATIONS) {
        Some(rest) => parse_tokens::<i64>(rest, line_no, "activation code")?
            .into_iter()
            .map(ActivationType::from_code)
            .collect(),
        None => return Err(PersistenceError::MissingSection("ACTIVATIONS")),
    };

    let mut network = Network::new(&architecture, &activations)?;

    match lines.next() {
        Some((_, line)) if line == WEIGHTS => {}
        _ => {
            warn!("weight file has no WEIGHTS section, keeping freshly initialised weights");
            return Ok(network);
        }
    }

    let mut weights: Vec<Vec<Vec<f64>>> = architecture.iter().map(|&n| vec![Vec::new(); n]).collect();
    let mut biases: Vec<Option<Vec<f64>>> = vec![None; architecture.len()];
    let mut current: Option<usize> = None;

    for (line_no, line) in lines {
        if let Some(rest) = line.strip_prefix(LAYER) {
            let idx = parse_index(rest, line_no, "layer")?;
            if idx >= architecture.len() {
                return Err(PersistenceError::malformed(line_no, format!("layer {idx} out of range")));
            }
            current = Some(idx);
        } else if let Some(rest) = line.strip_prefix(BIASES) {
            let layer = current.ok_or_else(|| PersistenceError::malformed(line_no, "BIASES before any LAYER"))?;
            biases[layer] = Some(parse_tokens(rest, line_no, "bias")?);
        } else if let Some(rest) = line.strip_prefix(NEURON) {
            let layer = current.ok_or_else(|| PersistenceError::malformed(line_no, "NEURON before any LAYER"))?;
            let (index, values) = rest
                .split_once(':')
                .ok_or_else(|| PersistenceError::malformed(line_no, "NEURON line without ':'"))?;
            let idx = parse_index(index, line_no, "neuron")?;
            if idx >= architecture[layer] {
                return Err(PersistenceError::malformed(
                    line_no,
                    format!("neuron {idx} out of range for layer {layer}"),
                ));
            }
            weights[layer][idx] = parse_tokens(values, line_no, "weight")?;
        } else {
            return Err(PersistenceError::malformed(line_no, format!("unexpected line `{line}`")));
        }
    }

    network.set_all_weights(&weights)?;
    for (layer, layer_biases) in biases.iter().enumerate() {
        if let Some(b) = layer_biases {
            network.set_layer_biases(layer, b)?;
        }
    }
    Ok(network)
}

fn check_parameter_count(architecture: &[usize], line: usize) -> Result<()> {
    let mut total: usize = 0;
    let mut fan_in = architecture.first().copied().unwrap_or(0);
    for &size in architecture {
        let layer = fan_in.checked_add(1).and_then(|per_neuron| per_neuron.checked_mul(size));
        total = match layer.and_then(|n| total.checked_add(n)) {
            Some(n) if n <= MAX_PARAMETERS => n,
            _ => {
                return Err(PersistenceError::malformed(
                    line,
                    format!("architecture exceeds {MAX_PARAMETERS} parameters"),
                ))
            }
        };
        fan_in = size;
    }
    Ok(())
}

fn fixed(x: f64) -> String {
    format!("{x:.10}")
}

fn join<I: Iterator<Item = String>>(items: I) -> String {
    items.collect::<Vec<_>>().join(" ")
}

fn parse_tokens<T: std::str::FromStr>(text: &str, line: usize, what: &str) -> Result<Vec<T>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<T>()
                .map_err(|_| PersistenceError::malformed(line, format!("invalid {what} `{tok}`")))
        })
        .collect()
}

/// Parses the `<n>` of `LAYER <n>:` / `NEURON <n>`.
fn parse_index(text: &str, line: usize, what: &str) -> Result<usize> {
    let text = text.trim().trim_end_matches(':').trim();
    text.parse::<usize>()
        .map_err(|_| PersistenceError::malformed(line, format!("invalid {what} index `{text}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationType::*;
    use crate::error::NetworkError;
    use approx::assert_relative_eq;

    fn sample_network() -> Network {
        Network::with_seed(&[3, 4, 2], &[Tanh, Sigmoid], 21).unwrap()
    }

    #[test]
    fn encoded_layout() {
        let text = encode_network(&Network::zeroed(&[2, 1], &[ReLU]).unwrap()).unwrap();
        let expected = "\
# MLP Network File v1
# Format: Architecture | Activations | Weights

ARCHITECTURE: 2 1
ACTIVATIONS: 2
WEIGHTS:
LAYER 0:
BIASES: 0.0000000000 0.0000000000
NEURON 0: 0.0000000000 0.0000000000
NEURON 1: 0.0000000000 0.0000000000
LAYER 1:
BIASES: 0.0000000000
NEURON 0: 0.0000000000 0.0000000000
";
        assert_eq!(text, expected);
    }

    #[test]
    fn round_trip_preserves_outputs() {
        let mut original = sample_network();
        let mut restored = decode_network(&encode_network(&original).unwrap()).unwrap();

        assert_eq!(restored.architecture(), original.architecture());
        assert_eq!(restored.activation_types(), original.activation_types());

        let inputs = [0.25, -1.5, 0.75];
        let a = original.forward(&inputs).unwrap();
        let b = restored.forward(&inputs).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(*x, *y, epsilon = 1e-8);
        }
    }

    #[test]
    fn missing_architecture_fails() {
        let err = decode_network("# header\nACTIVATIONS: 0\nWEIGHTS:\n").unwrap_err();
        assert!(matches!(err, PersistenceError::MissingSection("ARCHITECTURE")));
        assert!(matches!(decode_network(""), Err(PersistenceError::MissingSection("ARCHITECTURE"))));
    }

    #[test]
    fn missing_activations_fails() {
        let err = decode_network("ARCHITECTURE: 2 1\nWEIGHTS:\n").unwrap_err();
        assert!(matches!(err, PersistenceError::MissingSection("ACTIVATIONS")));
    }

    #[test]
    fn missing_weights_section_degrades_to_fresh_network() {
        let net = decode_network("# v1\n\nARCHITECTURE: 2 3 1\nACTIVATIONS: 1 3\n").unwrap();
        assert_eq!(net.architecture(), vec![2, 3, 1]);
        assert_eq!(net.activation_types(), &[Tanh, Linear]);
        assert!(net.get_all_weights()[1].iter().flatten().any(|w| *w != 0.0));
    }

    #[test]
    fn unknown_activation_code_becomes_sigmoid() {
        let net = decode_network("ARCHITECTURE: 1 1\nACTIVATIONS: 9\n").unwrap();
        assert_eq!(net.activation_types(), &[Sigmoid]);
    }

    #[test]
    fn shape_mismatch_fails() {
        let mut text = encode_network(&sample_network()).unwrap();
        text = text.replacen("NEURON 0: ", "NEURON 0: 1.0 ", 2);
        assert!(matches!(decode_network(&text), Err(PersistenceError::Network(NetworkError::Dimension { .. }))));
    }

    #[test]
    fn missing_layer_block_fails() {
        let text = "ARCHITECTURE: 1 1\nACTIVATIONS: 0\nWEIGHTS:\nLAYER 0:\nNEURON 0: 0.0\n";
        assert!(matches!(decode_network(text), Err(PersistenceError::Network(_))));
    }

    #[test]
    fn malformed_blocks_fail() {
        let head = "ARCHITECTURE: 1 1\nACTIVATIONS: 0\nWEIGHTS:\n";
        for body in [
            "NEURON 0: 1.0\n",
            "LAYER 5:\n",
            "LAYER 1:\nNEURON 3: 1.0\n",
            "LAYER 1:\nNEURON 0: abc\n",
            "LAYER 1:\nNEURON 0 1.0\n",
            "LAYER x:\n",
            "LAYER 1:\nSOMETHING ELSE\n",
        ] {
            let text = format!("{head}{body}");
            assert!(
                matches!(decode_network(&text), Err(PersistenceError::Malformed { .. })),
                "accepted: {body:?}"
            );
        }
        assert!(matches!(
            decode_network("ARCHITECTURE: 2 x\nACTIVATIONS: 0\n"),
            Err(PersistenceError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn structural_errors_surface() {
        assert!(matches!(
            decode_network("ARCHITECTURE: 2\nACTIVATIONS:\n"),
            Err(PersistenceError::Network(NetworkError::Structural(_)))
        ));
    }

    #[test]
    fn oversized_architecture_is_malformed() {
        for arch in ["18446744073709551615 1", "1 18446744073709551615", "100000 100000 1"] {
            let text = format!("# v1\nARCHITECTURE: {arch}\nACTIVATIONS: 0 0\n");
            assert!(
                matches!(decode_network(&text), Err(PersistenceError::Malformed { line: 2, .. })),
                "accepted: {arch}"
            );
        }
    }

    #[test]
    fn files_without_biases_keep_initialised_biases() {
        let text = "ARCHITECTURE: 1 1\nACTIVATIONS: 3\nWEIGHTS:\nLAYER 0:\nNEURON 0: 0.0\nLAYER 1:\nNEURON 0: 2.5\n";
        let net = decode_network(text).unwrap();
        assert_eq!(net.get_all_weights()[1][0], vec![2.5]);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.nui");
        let path = path.to_str().unwrap();

        let original = sample_network();
        save_network(&original, path).unwrap();
        let loaded = load_network(path).unwrap();
        assert_eq!(encode_network(&loaded).unwrap(), encode_network(&original).unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.nui");
        assert!(matches!(load_network(path.to_str().unwrap()), Err(PersistenceError::Io(_))));
    }
}
