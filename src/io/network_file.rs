//! Textual network configuration files.
//!
//! ## Format
//!
//! ```text
//! # comment
//! <neural network>
//! name: speakers
//! number of layers: 2
//! </neural network>
//! <SOM extension>
//! neighborhood function: gaussian
//! neighborhood parameters: 3 0 2 100
//! learning rate function: exponential
//! learning rate parameters: 2 0.1 100
//! </SOM extension>
//! <layer>
//! index: 1
//! class: input
//! name: input
//! number of units: 2
//! activation function: identity
//! </layer>
//! <unit>
//! layer: 2
//! index: 1
//! coordinate: 2 0 0
//! </unit>
//! <connection>
//! origin: 1 1
//! destination: 2 1
//! weight: 0.25
//! </connection>
//! <layer connection>
//! origin layer: 1
//! destination layer: 2
//! init function: uniform
//! init parameters: 2 0 1
//! </layer connection>
//! ```
//!
//! Sections appear in the order shown; layer, unit, connection and layer
//! connection sections repeat. Attributes are matched by prefix and vectors
//! use the `dimension v1 ... vN` encoding. Optional unit attributes fall back
//! to the layer's activation.

use crate::error::{Result, SomkitError};
use crate::function::{FunctionInstance, FunctionKind};
use crate::topology::{
    Extension, LayerClass, LayerId, LvqExtension, MlpExtension, Network, Placement, SomExtension, UnitId,
};
use crate::vector::Vector;
use log::debug;
use rand::Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const NETWORK: &str = "neural network";
const SOM: &str = "SOM extension";
const LVQ: &str = "LVQ extension";
const MLP: &str = "MLP extension";
const LAYER: &str = "layer";
const UNIT: &str = "unit";
const CONNECTION: &str = "connection";
const LAYER_CONNECTION: &str = "layer connection";

/// One `<tag> ... </tag>` block.
struct Section {
    tag: String,
    line: usize,
    attributes: Vec<(usize, String)>,
}

impl Section {
    /// Value of the first attribute line starting with `name`.
    fn get(&self, name: &str) -> Option<(usize, &str)> {
        self.attributes.iter().find_map(|(line, text)| {
            text.strip_prefix(name)
                .and_then(|rest| rest.trim_start().strip_prefix(':'))
                .map(|value| (*line, value.trim()))
        })
    }

    fn require(&self, name: &str) -> Result<(usize, &str)> {
        self.get(name)
            .ok_or_else(|| SomkitError::parse(self.line, format!("<{}> lacks '{}'", self.tag, name)))
    }

    fn text(&self, name: &str) -> Result<&str> {
        self.require(name).map(|(_, v)| v)
    }

    fn number<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
        let (line, value) = self.require(name)?;
        value
            .parse()
            .map_err(|_| SomkitError::parse(line, format!("bad value '{}' for '{}'", value, name)))
    }

    fn optional_number<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            Some(_) => self.number(name).map(Some),
            None => Ok(None),
        }
    }

    fn vector(&self, name: &str) -> Result<Option<Vector>> {
        match self.get(name) {
            Some((line, value)) => Vector::parse_encoded(value)
                .map(Some)
                .map_err(|e| SomkitError::parse(line, e.to_string())),
            None => Ok(None),
        }
    }

    fn pair(&self, name: &str) -> Result<(usize, usize)> {
        let (line, value) = self.require(name)?;
        let mut parts = value.split_whitespace().map(str::parse::<usize>);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
            _ => Err(SomkitError::parse(line, format!("expected 'layer unit' for '{}'", name))),
        }
    }

    /// A function given as `<prefix> function` plus optional `<prefix> parameters`.
    fn function(&self, prefix: &str, kind: FunctionKind) -> Result<Option<FunctionInstance>> {
        let Some((line, name)) = self.get(&format!("{} function", prefix)) else {
            return Ok(None);
        };
        let at = |e: SomkitError| SomkitError::parse(line, e.to_string());
        let mut f = FunctionInstance::by_name(kind, name).map_err(at)?;
        if let Some(params) = self.vector(&format!("{} parameters", prefix))? {
            f.set_params(params.as_slice()).map_err(at)?;
        }
        Ok(Some(f))
    }

    fn required_function(&self, prefix: &str, kind: FunctionKind) -> Result<FunctionInstance> {
        self.function(prefix, kind)?
            .ok_or_else(|| SomkitError::parse(self.line, format!("<{}> lacks '{} function'", self.tag, prefix)))
    }
}

fn split_sections(text: &str) -> Result<Vec<Section>> {
    let mut sections = Vec::new();
    let mut open: Option<Section> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(tag) = line.strip_prefix("</").and_then(|l| l.strip_suffix('>')) {
            match open.take() {
                Some(section) if section.tag == tag => sections.push(section),
                Some(section) => {
                    return Err(SomkitError::parse(
                        line_no,
                        format!("</{}> closes <{}>", tag, section.tag),
                    ))
                }
                None => return Err(SomkitError::parse(line_no, format!("</{}> without opening tag", tag))),
            }
        } else if let Some(tag) = line.strip_prefix('<').and_then(|l| l.strip_suffix('>')) {
            if let Some(section) = &open {
                return Err(SomkitError::parse(line_no, format!("<{}> inside <{}>", tag, section.tag)));
            }
            open = Some(Section {
                tag: tag.to_string(),
                line: line_no,
                attributes: Vec::new(),
            });
        } else {
            match &mut open {
                Some(section) => section.attributes.push((line_no, line.to_string())),
                None => return Err(SomkitError::parse(line_no, "attribute outside of a section")),
            }
        }
    }

    if let Some(section) = open {
        return Err(SomkitError::parse(section.line, format!("<{}> is never closed", section.tag)));
    }
    Ok(sections)
}

/// Section order rank; sections must not go back to a lower rank.
fn rank(tag: &str) -> Option<u8> {
    match tag {
        NETWORK => Some(0),
        SOM | LVQ | MLP => Some(1),
        LAYER => Some(2),
        UNIT => Some(3),
        CONNECTION => Some(4),
        LAYER_CONNECTION => Some(5),
        _ => None,
    }
}

fn unit_ref(network: &Network, line: usize, (layer, unit): (usize, usize)) -> Result<UnitId> {
    let at = |e: SomkitError| SomkitError::parse(line, e.to_string());
    let layer = network.layer_at(layer).map_err(at)?;
    network.unit_at(layer, unit).map_err(at)
}

fn layer_ref(network: &Network, section: &Section, name: &str) -> Result<LayerId> {
    let (line, _) = section.require(name)?;
    let position: usize = section.number(name)?;
    network
        .layer_at(position)
        .map_err(|e| SomkitError::parse(line, e.to_string()))
}

/// Parses a network from configuration text. `rng` drives any layer
/// connection initializers.
pub fn parse_network<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<Network> {
    let sections = split_sections(text)?;
    let mut network: Option<Network> = None;
    let mut declared_layers = 0usize;
    let mut last_rank = 0u8;
    let mut extension_seen = false;

    for section in &sections {
        let r = rank(&section.tag)
            .ok_or_else(|| SomkitError::parse(section.line, format!("unknown section <{}>", section.tag)))?;

        if section.tag == NETWORK {
            if network.is_some() {
                return Err(SomkitError::parse(section.line, "second <neural network> section"));
            }
            network = Some(Network::new(section.text("name")?));
            declared_layers = section.optional_number("number of layers")?.unwrap_or(0);
            continue;
        }

        let net = network
            .as_mut()
            .ok_or_else(|| SomkitError::parse(section.line, format!("<{}> before <{}>", section.tag, NETWORK)))?;
        if r < last_rank {
            return Err(SomkitError::parse(section.line, format!("<{}> out of order", section.tag)));
        }
        last_rank = r;
        if matches!(section.tag.as_str(), SOM | LVQ | MLP) {
            if extension_seen {
                return Err(SomkitError::parse(section.line, format!("second extension section <{}>", section.tag)));
            }
            extension_seen = true;
        }

        match section.tag.as_str() {
            SOM => {
                let neighborhood = section.required_function("neighborhood", FunctionKind::Neighborhood)?;
                let rate = section.required_function("learning rate", FunctionKind::LearningRate)?;
                let som = SomExtension::new(neighborhood, rate)
                    .map_err(|e| SomkitError::parse(section.line, e.to_string()))?;
                net.set_extension(Some(Extension::Som(som)));
            }
            LVQ => {
                let rate = section.required_function("learning rate", FunctionKind::LearningRate)?;
                let window = section.optional_number("window")?.unwrap_or(0.3);
                net.set_extension(Some(Extension::Lvq(LvqExtension::new(rate, window)?)));
            }
            MLP => {
                net.set_extension(Some(Extension::Mlp(MlpExtension {
                    learning_rate: section.optional_number("learning rate")?.unwrap_or(0.1),
                    momentum: section.optional_number("momentum")?.unwrap_or(0.0),
                })));
            }
            LAYER => read_layer(net, section)?,
            UNIT => read_unit(net, section)?,
            CONNECTION => {
                let origin = unit_ref(net, section.line, section.pair("origin")?)?;
                let destination = unit_ref(net, section.line, section.pair("destination")?)?;
                let weight: f64 = section.number("weight")?;
                net.connect(origin, destination, weight, None, rng)?;
            }
            LAYER_CONNECTION => {
                let origin = layer_ref(net, section, "origin layer")?;
                let destination = layer_ref(net, section, "destination layer")?;
                let weight = section.optional_number("weight")?.unwrap_or(0.0);
                let init = section.function("init", FunctionKind::WeightInit)?;
                net.connect_layers(origin, destination, weight, init.as_ref(), rng)?;
            }
            _ => unreachable!("rank() accepts only known tags"),
        }
    }

    let network = network.ok_or_else(|| SomkitError::parse(1, format!("missing <{}> section", NETWORK)))?;
    if declared_layers != 0 && declared_layers != network.layer_count() {
        return Err(SomkitError::parse(
            1,
            format!(
                "declared {} layers but read {}",
                declared_layers,
                network.layer_count()
            ),
        ));
    }
    debug!(
        "Parsed network '{}': {} layers, {} units, {} connections",
        network.name(),
        network.layer_count(),
        network.unit_count(),
        network.connection_count()
    );
    Ok(network)
}

fn read_layer(net: &mut Network, section: &Section) -> Result<()> {
    let class: LayerClass = section
        .text("class")?
        .parse()
        .map_err(|e: SomkitError| SomkitError::parse(section.line, e.to_string()))?;
    let name = section.get("name").map(|(_, v)| v.to_string()).unwrap_or_default();
    let units: usize = section.number("number of units")?;
    let index: Option<usize> = section.optional_number("index")?;
    if let Some(index) = index {
        if index != net.layer_count() + 1 {
            return Err(SomkitError::parse(
                section.line,
                format!("layer index {} but {} layers read", index, net.layer_count()),
            ));
        }
    }

    let function = section.function("activation", FunctionKind::Activation)?;
    let layer = net.create_layer(class, name, Placement::Append)?;
    for _ in 0..units {
        net.add_unit(layer, function.clone())?;
    }
    Ok(())
}

fn read_unit(net: &mut Network, section: &Section) -> Result<()> {
    let layer: usize = section.number("layer")?;
    let index: usize = section.number("index")?;
    let unit = unit_ref(net, section.line, (layer, index))?;

    if let Some(f) = section.function("activation", FunctionKind::Activation)? {
        net.set_unit_function(unit, f)?;
    }
    if let Some(coordinate) = section.vector("coordinate")? {
        net.set_unit_coordinate(unit, Some(coordinate))?;
    }
    let average = section.optional_number("average")?;
    let std_dev = section.optional_number("std dev")?;
    if average.is_some() || std_dev.is_some() {
        net.set_unit_stats(unit, average.unwrap_or(0.0), std_dev.unwrap_or(0.0))?;
    }
    Ok(())
}

/// Reads a network configuration file.
pub fn read_network<R: Rng + ?Sized>(path: impl AsRef<Path>, rng: &mut R) -> Result<Network> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SomkitError::FileNotFound(path.to_path_buf()));
    }
    parse_network(&fs::read_to_string(path)?, rng)
}

fn write_function<W: Write>(out: &mut W, prefix: &str, f: &FunctionInstance) -> Result<()> {
    writeln!(out, "{} function: {}", prefix, f.name())?;
    if !f.params().is_empty() {
        writeln!(out, "{} parameters: {}", prefix, Vector::from(f.params()).encode())?;
    }
    Ok(())
}

/// Writes a network in the configuration format. Every connection is
/// written explicitly, grouped by destination unit in incoming order, so
/// reading the text back reproduces each unit's weight vector.
pub fn write_network_to<W: Write>(network: &Network, mut out: W) -> Result<()> {
    writeln!(out, "# somkit network")?;
    writeln!(out, "<{}>", NETWORK)?;
    writeln!(out, "name: {}", network.name())?;
    writeln!(out, "number of layers: {}", network.layer_count())?;
    writeln!(out, "</{}>", NETWORK)?;

    if let Some(extension) = network.extension() {
        writeln!(out, "<{}>", extension.tag())?;
        match extension {
            Extension::Som(som) => {
                write_function(&mut out, "neighborhood", som.neighborhood())?;
                write_function(&mut out, "learning rate", som.learning_rate())?;
            }
            Extension::Lvq(lvq) => {
                write_function(&mut out, "learning rate", &lvq.learning_rate)?;
                writeln!(out, "window: {}", lvq.window)?;
            }
            Extension::Mlp(mlp) => {
                writeln!(out, "learning rate: {}", mlp.learning_rate)?;
                writeln!(out, "momentum: {}", mlp.momentum)?;
            }
        }
        writeln!(out, "</{}>", extension.tag())?;
    }

    for &lid in network.layer_ids() {
        let layer = network.layer(lid)?;
        writeln!(out, "<{}>", LAYER)?;
        writeln!(out, "index: {}", layer.index())?;
        writeln!(out, "class: {}", layer.class())?;
        writeln!(out, "name: {}", layer.name())?;
        writeln!(out, "number of units: {}", layer.unit_count())?;
        write_function(&mut out, "activation", &layer.class().default_activation().instance())?;
        writeln!(out, "</{}>", LAYER)?;
    }

    for &lid in network.layer_ids() {
        let layer = network.layer(lid)?;
        let default = layer.class().default_activation();
        for &uid in layer.units() {
            let unit = network.unit(uid)?;
            let custom = unit.function().class() != default || unit.function().params() != default.defaults().as_slice();
            let has_stats = unit.average() != 0.0 || unit.std_dev() != 0.0;
            if !custom && unit.coordinate().is_none() && !has_stats {
                continue;
            }
            writeln!(out, "<{}>", UNIT)?;
            writeln!(out, "layer: {}", layer.index())?;
            writeln!(out, "index: {}", unit.index())?;
            if custom {
                write_function(&mut out, "activation", unit.function())?;
            }
            if let Some(c) = unit.coordinate() {
                writeln!(out, "coordinate: {}", c.encode())?;
            }
            if has_stats {
                writeln!(out, "average: {}", unit.average())?;
                writeln!(out, "std dev: {}", unit.std_dev())?;
            }
            writeln!(out, "</{}>", UNIT)?;
        }
    }

    for &lid in network.layer_ids() {
        let layer = network.layer(lid)?;
        for &uid in layer.units() {
            let unit = network.unit(uid)?;
            for &cid in unit.destination_connections() {
                let conn = network.connection(cid)?;
                let origin = network.unit(conn.origin())?;
                let origin_layer = origin
                    .layer()
                    .map(|l| network.layer(l).map(|l| l.index()))
                    .transpose()?
                    .filter(|&i| i > 0)
                    .ok_or_else(|| SomkitError::Structure(format!("{} origin is detached", cid)))?;
                writeln!(out, "<{}>", CONNECTION)?;
                writeln!(out, "origin: {} {}", origin_layer, origin.index())?;
                writeln!(out, "destination: {} {}", layer.index(), unit.index())?;
                writeln!(out, "weight: {}", conn.weight())?;
                writeln!(out, "</{}>", CONNECTION)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Renders a network in the configuration format.
pub fn render_network(network: &Network) -> Result<String> {
    let mut buf = Vec::new();
    write_network_to(network, &mut buf)?;
    String::from_utf8(buf).map_err(|e| SomkitError::Serialization(e.to_string()))
}

/// Writes a network configuration file.
pub fn write_network(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    write_network_to(network, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SAMPLE: &str = "\
# two inputs, four map units
<neural network>
name: sample
number of layers: 2
</neural network>
<SOM extension>
neighborhood function: rectangular
neighborhood parameters: 3 0 10 1000
learning rate function: constant
learning rate parameters: 1 0.05
</SOM extension>
<layer>
index: 1
class: input
name: in
number of units: 2
</layer>
<layer>
index: 2
class: output
name: map
number of units: 4
activation function: identity
</layer>
<unit>
layer: 2
index: 3
coordinate: 2 1 0
</unit>
<layer connection>
origin layer: 1
destination layer: 2
weight: 0.5
</layer connection>
";

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(3)
    }

    #[test]
    fn test_parse_sample() {
        let net = parse_network(SAMPLE, &mut rng()).unwrap();
        assert_eq!(net.name(), "sample");
        assert_eq!(net.layer_count(), 2);
        assert_eq!(net.unit_count(), 6);
        assert_eq!(net.connection_count(), 8);
        let som = net.som().unwrap();
        assert_eq!(som.neighborhood().params(), &[0.0, 10.0, 1000.0]);
        assert_eq!(som.learning_rate().evaluate(3.0), 0.05);

        let map = net.layer_at(2).unwrap();
        let u = net.unit_at(map, 3).unwrap();
        assert_eq!(net.unit(u).unwrap().coordinate().unwrap().as_slice(), &[1.0, 0.0]);
        assert_eq!(net.unit_weights(u).unwrap().as_slice(), &[0.5, 0.5]);
        net.check_invariants().unwrap();
    }

    #[test]
    fn test_attribute_prefix_and_comments() {
        let text = "<neural network>\n# note\nname:   spaced  \n</neural network>\n";
        let net = parse_network(text, &mut rng()).unwrap();
        assert_eq!(net.name(), "spaced");
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let unclosed = "<neural network>\nname: x\n";
        assert!(matches!(parse_network(unclosed, &mut rng()), Err(SomkitError::Parse { line: 1, .. })));

        let unknown = "<neural network>\nname: x\n</neural network>\n<bogus>\n</bogus>\n";
        assert!(matches!(parse_network(unknown, &mut rng()), Err(SomkitError::Parse { line: 4, .. })));

        let bad_vector = SAMPLE.replace("neighborhood parameters: 3 0 10 1000", "neighborhood parameters: 3 0 10");
        assert!(matches!(parse_network(&bad_vector, &mut rng()), Err(SomkitError::Parse { line: 8, .. })));

        let wrong_count = SAMPLE.replace("number of layers: 2", "number of layers: 3");
        assert!(parse_network(&wrong_count, &mut rng()).is_err());

        let bad_ref = SAMPLE.replace("layer: 2\nindex: 3", "layer: 2\nindex: 9");
        assert!(parse_network(&bad_ref, &mut rng()).is_err());
    }

    #[test]
    fn test_section_order_enforced() {
        let text = "\
<neural network>
name: x
</neural network>
<layer>
class: input
number of units: 1
</layer>
<SOM extension>
neighborhood function: gaussian
learning rate function: constant
</SOM extension>
";
        assert!(parse_network(text, &mut rng()).is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut original = parse_network(SAMPLE, &mut rng()).unwrap();
        let map = original.layer_at(2).unwrap();
        let u = original.unit_at(map, 2).unwrap();
        original.set_unit_weights(u, &Vector::from(vec![0.125, -3.75])).unwrap();
        let f = FunctionInstance::with_params(FunctionKind::Activation, "sigmoid", &[2.0]).unwrap();
        original.set_unit_function(u, f.clone()).unwrap();

        let text = render_network(&original).unwrap();
        let copy = parse_network(&text, &mut rng()).unwrap();

        assert_eq!(copy.layer_count(), original.layer_count());
        assert_eq!(copy.connection_count(), original.connection_count());
        assert_eq!(copy.som().unwrap(), original.som().unwrap());
        for position in 1..=original.layer_count() {
            let a = original.layer_at(position).unwrap();
            let b = copy.layer_at(position).unwrap();
            assert_eq!(original.layer(a).unwrap().unit_count(), copy.layer(b).unwrap().unit_count());
            for i in 1..=original.layer(a).unwrap().unit_count() {
                let ua = original.unit_at(a, i).unwrap();
                let ub = copy.unit_at(b, i).unwrap();
                assert_eq!(original.unit_weights(ua).unwrap(), copy.unit_weights(ub).unwrap());
                assert_eq!(original.unit(ua).unwrap().coordinate(), copy.unit(ub).unwrap().coordinate());
            }
        }
        let ub = copy.unit_at(copy.layer_at(2).unwrap(), 2).unwrap();
        assert_eq!(copy.unit(ub).unwrap().function(), &f);
    }

    #[test]
    fn test_extensions_round_trip() {
        let mut net = Network::new("ext");
        let rate = FunctionInstance::by_name(FunctionKind::LearningRate, "inverse").unwrap();
        net.set_extension(Some(Extension::Lvq(LvqExtension::new(rate, 0.25).unwrap())));
        let copy = parse_network(&render_network(&net).unwrap(), &mut rng()).unwrap();
        assert_eq!(copy.extension(), net.extension());

        net.set_extension(Some(Extension::Mlp(MlpExtension {
            learning_rate: 0.2,
            momentum: 0.5,
        })));
        let copy = parse_network(&render_network(&net).unwrap(), &mut rng()).unwrap();
        assert_eq!(copy.extension(), net.extension());
    }

    #[test]
    fn test_second_extension_rejected() {
        let text = "\
<neural network>
name: x
</neural network>
<SOM extension>
neighborhood function: gaussian
learning rate function: constant
</SOM extension>
<LVQ extension>
learning rate function: constant
</LVQ extension>
";
        assert!(matches!(parse_network(text, &mut rng()), Err(SomkitError::Parse { line: 8, .. })));
    }

    #[test]
    fn test_write_to_reports_io_errors() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "device full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let net = parse_network(SAMPLE, &mut rng()).unwrap();
        assert!(matches!(write_network_to(&net, Full), Err(SomkitError::Io(_))));

        let mut buf = Vec::new();
        write_network_to(&net, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), render_network(&net).unwrap());
    }
}
