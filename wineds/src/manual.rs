/*!

This is the long-form manual for `wineds` and `wineds-convert`.

## Input files

Two files describe an election:
* the precinct index, a CSV file listing every precinct with its districts
* the export of the WinEDS Reporting Tool, a text file of fixed-width lines
  with one vote total per line

### Precinct index

The first row is a header. The columns are:

```text
VotingPrecinctID,VotingPrecinctName,MailBallotPrecinct,BalType,Assembly,BART,Congressional,Neighborhood,Senatorial,Supervisorial
```

The district columns contain district numbers. The neighborhood column
contains a short label such as `SOMA`, which the reports replace by the
full name (`SOUTH OF MARKET`). Fields are split on commas, quoting is not
supported. A precinct listed twice is only taken from its first row.

### Export file

Each line has the following columns (default widths in parentheses):

| column         | width |
|----------------|-------|
| data           | 26    |
| contest name   | 56    |
| choice name    | 38    |
| precinct name  | 30    |
| district name  | 25    |
| reporting type | 30    |

The reporting type is only present in the files split between election day
and vote-by-mail ballots. The length of the first line (175 or 205
characters with the default widths) tells which variant the file uses. The
widths can be changed in the configuration file of `wineds-convert`.

The data column has the following structure:

```text
0AAACCCPPPPTTTTT[PTY]

AAA   = contest number
CCC   = choice id
PPPP  = precinct id
TTTTT = vote total, or 000-1 for -1
PTY   = party code (optional)
```

Contests 1 (`REGISTERED VOTERS - TOTAL`) and 2 (`BALLOTS CAST - TOTAL`)
carry the registration and the turnout of each precinct. Lines of these
contests with a party code break the totals down by party. They are
checked but do not appear in the reports.

## Processing

The export file is read twice. The first pass collects the contests, the
choices and the precincts, and checks that the lines agree with each other:
* a precinct always has the same name
* a contest always has the same district
* a choice id always designates the same choice of the same contest
* the precincts of the export are exactly the precincts of the index

The second pass stores the totals. Every total must go to a slot found in
the first pass, and no slot may be written twice.

When several contest numbers share a name, the party code is added in
front of the name in the reports.

## Reports

For each contest, the report lists:
* the totals of each precinct (one row per reporting channel when the file
  is split by channel)
* the grand totals
* the totals of each district and neighborhood that has precincts in the
  contest, then the totals of the city

The turnout is the ballots cast divided by the registered voters, in
percent with two decimals (`0.00` when there are no registered voters).

*/
